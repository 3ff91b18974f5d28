use axum::{extract::Query, extract::State, Json};
use serde::{Deserialize, Serialize};

use super::{attach_posters, AppState};
use crate::models::MovieView;

const SEARCH_LIMIT: usize = 20;
const SEARCH_POSTERS: usize = 8;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    q: String,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub movies: Vec<MovieView>,
}

/// Free-text title search. An empty query yields an empty result rather
/// than an error.
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> Json<SearchResponse> {
    if params.q.is_empty() {
        return Json(SearchResponse { movies: vec![] });
    }

    let mut movies: Vec<MovieView> = state
        .catalog
        .search(&params.q, SEARCH_LIMIT)
        .into_iter()
        .map(MovieView::from)
        .collect();
    attach_posters(&state.enrichment, &mut movies, SEARCH_POSTERS).await;

    Json(SearchResponse { movies })
}
