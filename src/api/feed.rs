use axum::{extract::State, Json};
use serde::Serialize;

use super::{attach_posters, AppState};
use crate::models::MovieView;

const FEATURED_LIMIT: usize = 20;
const FEATURED_POSTERS: usize = 10;
const GENRE_ROW_LIMIT: usize = 10;
const GENRE_ROW_POSTERS: usize = 5;

#[derive(Debug, Serialize)]
pub struct FeedResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hero: Option<MovieView>,
    pub featured: Vec<MovieView>,
    pub action: Vec<MovieView>,
    pub comedy: Vec<MovieView>,
    pub genres: Vec<String>,
}

/// Home feed: a fully enriched hero movie, the featured shelf, two genre
/// rows, and the genre list. Every section degrades to empty on failure;
/// the feed itself never errors.
pub async fn feed(State(state): State<AppState>) -> Json<FeedResponse> {
    let mut featured: Vec<MovieView> = state
        .catalog
        .featured(FEATURED_LIMIT)
        .into_iter()
        .map(MovieView::from)
        .collect();
    attach_posters(&state.enrichment, &mut featured, FEATURED_POSTERS).await;

    let hero = match featured.first() {
        Some(first) => {
            let mut hero = first.clone();
            state.enrichment.enrich(&mut hero).await;
            Some(hero)
        }
        None => None,
    };

    let mut action: Vec<MovieView> = state
        .catalog
        .by_genre("Action", GENRE_ROW_LIMIT)
        .into_iter()
        .map(MovieView::from)
        .collect();
    attach_posters(&state.enrichment, &mut action, GENRE_ROW_POSTERS).await;

    let mut comedy: Vec<MovieView> = state
        .catalog
        .by_genre("Comedy", GENRE_ROW_LIMIT)
        .into_iter()
        .map(MovieView::from)
        .collect();
    attach_posters(&state.enrichment, &mut comedy, GENRE_ROW_POSTERS).await;

    Json(FeedResponse {
        hero,
        featured,
        action,
        comedy,
        genres: state.catalog.genres(),
    })
}
