use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::{attach_posters, AppState};
use crate::error::{AppError, AppResult};
use crate::models::MovieView;

const SIMILAR_LIMIT: usize = 6;
const SIMILAR_POSTERS: usize = 4;
const GENRE_PAGE_LIMIT: usize = 30;
const GENRE_PAGE_POSTERS: usize = 12;
const LIST_LIMIT_DEFAULT: usize = 100;
const LIST_LIMIT_MAX: usize = 500;
const RANDOM_COUNT: usize = 10;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct MovieDetailResponse {
    pub movie: MovieView,
    pub similar: Vec<MovieView>,
}

#[derive(Debug, Serialize)]
pub struct GenreMoviesResponse {
    pub genre: String,
    pub movies: Vec<MovieView>,
}

/// Movies in dataset order, up to a capped limit
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> Json<Vec<MovieView>> {
    let limit = params.limit.unwrap_or(LIST_LIMIT_DEFAULT).min(LIST_LIMIT_MAX);
    let movies = state
        .catalog
        .all(limit)
        .into_iter()
        .map(MovieView::from)
        .collect();
    Json(movies)
}

/// A random pick of decently rated movies
pub async fn random_picks(State(state): State<AppState>) -> Json<Vec<MovieView>> {
    let movies = state
        .catalog
        .random(RANDOM_COUNT)
        .into_iter()
        .map(MovieView::from)
        .collect();
    Json(movies)
}

/// Single movie detail: enriched record plus similar titles from its first
/// genre. Unknown ids are a 404.
pub async fn detail(
    State(state): State<AppState>,
    Path(movie_id): Path<i64>,
) -> AppResult<Json<MovieDetailResponse>> {
    let record = state
        .catalog
        .by_id(movie_id)
        .ok_or_else(|| AppError::NotFound(format!("No movie with id {}", movie_id)))?;

    let similar_genre = record
        .genres
        .first()
        .cloned()
        .unwrap_or_else(|| "Drama".to_string());

    let mut movie = MovieView::from(record);
    state.enrichment.enrich(&mut movie).await;

    let mut similar: Vec<MovieView> = state
        .catalog
        .by_genre(&similar_genre, SIMILAR_LIMIT)
        .into_iter()
        .map(MovieView::from)
        .collect();
    attach_posters(&state.enrichment, &mut similar, SIMILAR_POSTERS).await;

    Ok(Json(MovieDetailResponse { movie, similar }))
}

/// All genre names in the dataset
pub async fn genres(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.catalog.genres())
}

/// Movies within one genre
pub async fn by_genre(
    State(state): State<AppState>,
    Path(genre): Path<String>,
) -> Json<GenreMoviesResponse> {
    let mut movies: Vec<MovieView> = state
        .catalog
        .by_genre(&genre, GENRE_PAGE_LIMIT)
        .into_iter()
        .map(MovieView::from)
        .collect();
    attach_posters(&state.enrichment, &mut movies, GENRE_PAGE_POSTERS).await;

    Json(GenreMoviesResponse { genre, movies })
}
