pub mod enrichment;
pub mod omdb;
pub mod recommender;

pub use enrichment::EnrichmentService;
pub use omdb::{DetailLookup, OmdbClient};
pub use recommender::{build_recommender, FallbackRecommender, Recommender};
