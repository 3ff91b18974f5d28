use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use reelfeed::api::{create_router, AppState};
use reelfeed::catalog::MovieCatalog;
use reelfeed::config::Config;
use reelfeed::db::{self, PgEnrichmentStore};
use reelfeed::services::recommender::build_recommender;
use reelfeed::services::{DetailLookup, EnrichmentService, OmdbClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    // The dataset is the one hard startup requirement; without it no query
    // can be answered.
    let catalog = Arc::new(MovieCatalog::load(&config.data_dir)?);
    tracing::info!(movies = catalog.len(), "Movie catalog ready");

    let pool = db::create_pool(&config.database_url)?;
    db::run_migrations(&pool).await;
    let store = Arc::new(PgEnrichmentStore::new(pool));

    let lookup = match &config.omdb_api_key {
        Some(api_key) => Some(Arc::new(OmdbClient::new(
            api_key.clone(),
            config.omdb_api_url.clone(),
        )) as Arc<dyn DetailLookup>),
        None => {
            tracing::warn!("OMDB_API_KEY unset, enrichment lookups disabled");
            None
        }
    };
    let enrichment = EnrichmentService::new(store, lookup);

    let recommender = build_recommender(&config);

    let state = AppState::new(catalog, enrichment, recommender);
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
