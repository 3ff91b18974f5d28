pub mod enrichment_store;
pub mod postgres;

pub use enrichment_store::{EnrichmentStore, PgEnrichmentStore, StoredEnrichment};
pub use postgres::{create_pool, run_migrations};
