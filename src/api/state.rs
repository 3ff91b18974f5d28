use std::sync::Arc;

use crate::catalog::MovieCatalog;
use crate::services::{EnrichmentService, Recommender};

/// Shared application state handed to request handlers.
///
/// All components are explicit instances (no module-level globals) so tests
/// can assemble a state with a fresh cache and stub backends.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<MovieCatalog>,
    pub enrichment: EnrichmentService,
    pub recommender: Arc<dyn Recommender>,
}

impl AppState {
    pub fn new(
        catalog: Arc<MovieCatalog>,
        enrichment: EnrichmentService,
        recommender: Arc<dyn Recommender>,
    ) -> Self {
        Self {
            catalog,
            enrichment,
            recommender,
        }
    }
}
