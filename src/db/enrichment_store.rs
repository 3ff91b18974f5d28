use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::error::AppResult;
use crate::models::MovieDetails;

/// A row of the durable enrichment cache
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct StoredEnrichment {
    pub cache_key: String,
    pub title: Option<String>,
    pub imdb_id: Option<String>,
    pub poster_url: Option<String>,
    pub imdb_rating: Option<String>,
    pub director: Option<String>,
    pub actors: Option<String>,
    pub awards: Option<String>,
    pub cached_at: DateTime<Utc>,
}

impl StoredEnrichment {
    /// Builds a row from freshly fetched details
    pub fn from_details(cache_key: &str, details: &MovieDetails) -> Self {
        Self {
            cache_key: cache_key.to_string(),
            title: details.title.clone(),
            imdb_id: details.imdb_id.clone(),
            poster_url: details.poster.clone(),
            imdb_rating: details.imdb_rating.clone(),
            director: details.director.clone(),
            actors: details.actors.clone(),
            awards: details.awards.clone(),
            cached_at: Utc::now(),
        }
    }

    /// Reconstructs details from a cached row. Fields the durable tier does
    /// not persist (year, plot) come back empty.
    pub fn to_details(&self) -> MovieDetails {
        MovieDetails {
            title: self.title.clone(),
            year: None,
            director: self.director.clone(),
            actors: self.actors.clone(),
            plot: None,
            poster: self.poster_url.clone(),
            imdb_rating: self.imdb_rating.clone(),
            imdb_id: self.imdb_id.clone(),
            awards: self.awards.clone(),
        }
    }
}

/// Durable key-value tier of the enrichment cache.
///
/// The enrichment service only ever reads by key and upserts by key; the
/// trait seam keeps the service testable without a live database.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait EnrichmentStore: Send + Sync {
    async fn get(&self, cache_key: &str) -> AppResult<Option<StoredEnrichment>>;

    async fn upsert(&self, record: &StoredEnrichment) -> AppResult<()>;
}

/// PostgreSQL-backed enrichment store
#[derive(Clone)]
pub struct PgEnrichmentStore {
    pool: PgPool,
}

impl PgEnrichmentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl EnrichmentStore for PgEnrichmentStore {
    async fn get(&self, cache_key: &str) -> AppResult<Option<StoredEnrichment>> {
        let row = sqlx::query_as::<_, StoredEnrichment>(
            r#"
            SELECT cache_key, title, imdb_id, poster_url, imdb_rating,
                   director, actors, awards, cached_at
            FROM enrichment_cache
            WHERE cache_key = $1
            "#,
        )
        .bind(cache_key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn upsert(&self, record: &StoredEnrichment) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO enrichment_cache
                (cache_key, title, imdb_id, poster_url, imdb_rating,
                 director, actors, awards, cached_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (cache_key) DO UPDATE SET
                title = EXCLUDED.title,
                imdb_id = EXCLUDED.imdb_id,
                poster_url = EXCLUDED.poster_url,
                imdb_rating = EXCLUDED.imdb_rating,
                director = EXCLUDED.director,
                actors = EXCLUDED.actors,
                awards = EXCLUDED.awards,
                cached_at = EXCLUDED.cached_at
            "#,
        )
        .bind(&record.cache_key)
        .bind(&record.title)
        .bind(&record.imdb_id)
        .bind(&record.poster_url)
        .bind(&record.imdb_rating)
        .bind(&record.director)
        .bind(&record.actors)
        .bind(&record.awards)
        .bind(record.cached_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
