use axum::{extract::Query, extract::State, Json};
use serde::{Deserialize, Serialize};

use super::{attach_posters, AppState};
use crate::error::{AppError, AppResult};
use crate::models::{Criterion, MovieView};

/// Recommendations draw from the well-known slice of the catalog
const POOL_LIMIT: usize = 100;
const RECOMMEND_LIMIT: usize = 12;
const RECOMMEND_POSTERS: usize = 6;

#[derive(Debug, Deserialize)]
pub struct MoodQuery {
    #[serde(default)]
    mood: String,
}

#[derive(Debug, Deserialize)]
pub struct GenreQuery {
    #[serde(default)]
    genre: String,
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub movies: Vec<MovieView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
}

/// Mood-based recommendations
pub async fn by_mood(
    State(state): State<AppState>,
    Query(params): Query<MoodQuery>,
) -> AppResult<Json<RecommendationResponse>> {
    if params.mood.is_empty() {
        return Err(AppError::InvalidInput("Mood is required".to_string()));
    }

    let pool = state.catalog.featured(POOL_LIMIT);
    let criterion = Criterion::Mood(params.mood.clone());
    let picks = state
        .recommender
        .propose(&criterion, &pool, RECOMMEND_LIMIT)
        .await;

    let mut movies: Vec<MovieView> = picks.into_iter().map(MovieView::from).collect();
    attach_posters(&state.enrichment, &mut movies, RECOMMEND_POSTERS).await;

    Ok(Json(RecommendationResponse {
        movies,
        mood: Some(params.mood),
        genre: None,
    }))
}

/// Genre-based recommendations
pub async fn by_genre(
    State(state): State<AppState>,
    Query(params): Query<GenreQuery>,
) -> AppResult<Json<RecommendationResponse>> {
    if params.genre.is_empty() {
        return Err(AppError::InvalidInput("Genre is required".to_string()));
    }

    let pool = state.catalog.featured(POOL_LIMIT);
    let criterion = Criterion::Genre(params.genre.clone());
    let picks = state
        .recommender
        .propose(&criterion, &pool, RECOMMEND_LIMIT)
        .await;

    let mut movies: Vec<MovieView> = picks.into_iter().map(MovieView::from).collect();
    attach_posters(&state.enrichment, &mut movies, RECOMMEND_POSTERS).await;

    Ok(Json(RecommendationResponse {
        movies,
        mood: None,
        genre: Some(params.genre),
    }))
}
