use axum::{http::StatusCode, routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::models::MovieView;
use crate::services::EnrichmentService;

pub mod feed;
pub mod movies;
pub mod recommend;
pub mod search;
mod state;

pub use state::AppState;

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/feed", get(feed::feed))
        .route("/search", get(search::search))
        .route("/recommendations/mood", get(recommend::by_mood))
        .route("/recommendations/genre", get(recommend::by_genre))
        .route("/movies", get(movies::list))
        .route("/movies/random", get(movies::random_picks))
        .route("/movies/:id", get(movies::detail))
        .route("/genres", get(movies::genres))
        .route("/genres/:name/movies", get(movies::by_genre))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Attaches poster URLs to the first `count` views. Enrichment is
/// best-effort: lookups that miss or fail leave the view untouched.
pub(crate) async fn attach_posters(
    enrichment: &EnrichmentService,
    views: &mut [MovieView],
    count: usize,
) {
    for view in views.iter_mut().take(count) {
        if let Some(url) = enrichment.poster_url(&view.movie.title).await {
            view.poster_url = Some(url);
        }
    }
}
