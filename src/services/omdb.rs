use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::models::MovieDetails;

/// External lookups use a short bounded timeout; a slow backend must never
/// stall page rendering.
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Query for the detail lookup backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailQuery {
    ImdbId(String),
    Title(String),
}

/// Detail lookup backend abstraction.
///
/// `Ok(None)` means the backend answered "not found"; `Err` means a
/// transport or decoding failure. The distinction matters to the cache:
/// confirmed misses are negatively cached, failures are not cached at all.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait DetailLookup: Send + Sync {
    async fn lookup(&self, query: &DetailQuery) -> AppResult<Option<MovieDetails>>;
}

/// OMDb API client
#[derive(Clone)]
pub struct OmdbClient {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

/// Raw OMDb response. OMDb reports lookup misses in-band via
/// `"Response": "False"` rather than an HTTP status.
#[derive(Debug, Deserialize)]
struct OmdbResponse {
    #[serde(rename = "Response")]
    response: String,
    #[serde(rename = "Title", default)]
    title: Option<String>,
    #[serde(rename = "Year", default)]
    year: Option<String>,
    #[serde(rename = "Director", default)]
    director: Option<String>,
    #[serde(rename = "Actors", default)]
    actors: Option<String>,
    #[serde(rename = "Plot", default)]
    plot: Option<String>,
    #[serde(rename = "Poster", default)]
    poster: Option<String>,
    #[serde(rename = "imdbRating", default)]
    imdb_rating: Option<String>,
    #[serde(rename = "imdbID", default)]
    imdb_id: Option<String>,
    #[serde(rename = "Awards", default)]
    awards: Option<String>,
}

impl OmdbClient {
    pub fn new(api_key: String, api_url: String) -> Self {
        let http_client = HttpClient::builder()
            .timeout(LOOKUP_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            http_client,
            api_key,
            api_url,
        }
    }

    /// OMDb expects IMDb ids with the "tt" prefix
    fn normalize_imdb_id(imdb_id: &str) -> String {
        if imdb_id.starts_with("tt") {
            imdb_id.to_string()
        } else {
            format!("tt{}", imdb_id)
        }
    }

    fn convert_response(raw: OmdbResponse) -> Option<MovieDetails> {
        if raw.response != "True" {
            return None;
        }

        Some(MovieDetails {
            title: raw.title,
            year: raw.year,
            director: raw.director,
            actors: raw.actors,
            plot: raw.plot,
            poster: raw.poster.filter(|p| p != "N/A"),
            imdb_rating: raw.imdb_rating,
            imdb_id: raw.imdb_id,
            awards: raw.awards,
        })
    }
}

#[async_trait::async_trait]
impl DetailLookup for OmdbClient {
    async fn lookup(&self, query: &DetailQuery) -> AppResult<Option<MovieDetails>> {
        let mut params = vec![
            ("apikey", self.api_key.clone()),
            ("plot", "short".to_string()),
        ];
        match query {
            DetailQuery::ImdbId(id) => params.push(("i", Self::normalize_imdb_id(id))),
            DetailQuery::Title(title) => params.push(("t", title.clone())),
        }

        let response = self
            .http_client
            .get(&self.api_url)
            .query(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "OMDb request failed");
            return Err(AppError::ExternalApi(format!(
                "OMDb returned status {}: {}",
                status, body
            )));
        }

        let raw: OmdbResponse = response.json().await?;
        let details = Self::convert_response(raw);

        if details.is_none() {
            tracing::debug!(query = ?query, "Movie not found on OMDb");
        }

        Ok(details)
    }
}
