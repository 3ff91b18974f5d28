use serde::{Deserialize, Serialize};

/// A movie loaded from the tabular dataset.
///
/// Numeric fields are coerced to definite numbers at load time (absent or
/// non-numeric values become 0), so sorting and filtering never deal with
/// missing values.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MovieRecord {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<String>,
    pub title: String,
    pub overview: String,
    pub genres: Vec<String>,
    pub keywords: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub cast: Vec<String>,
    pub release_date: String,
    pub vote_average: f64,
    pub vote_count: i64,
    pub popularity: f64,
    pub runtime: i64,
}

/// Enrichment data for a single movie, as returned by the detail lookup
/// backend and held in both cache tiers.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MovieDetails {
    pub title: Option<String>,
    pub year: Option<String>,
    pub director: Option<String>,
    pub actors: Option<String>,
    pub plot: Option<String>,
    /// Poster URL; a backend value of "N/A" is normalized to `None`
    pub poster: Option<String>,
    pub imdb_rating: Option<String>,
    pub imdb_id: Option<String>,
    pub awards: Option<String>,
}

/// Free-text criterion driving a recommendation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Criterion {
    Mood(String),
    Genre(String),
}

impl Criterion {
    pub fn text(&self) -> &str {
        match self {
            Criterion::Mood(s) | Criterion::Genre(s) => s,
        }
    }
}

/// A selected movie with an optional human-readable justification
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Recommendation {
    #[serde(flatten)]
    pub movie: MovieRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Recommendation {
    pub fn new(movie: MovieRecord) -> Self {
        Self {
            movie,
            reason: None,
        }
    }

    pub fn with_reason(movie: MovieRecord, reason: Option<String>) -> Self {
        Self { movie, reason }
    }
}

/// A movie as rendered to clients, optionally decorated with enrichment data
#[derive(Debug, Clone, Serialize)]
pub struct MovieView {
    #[serde(flatten)]
    pub movie: MovieRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imdb_rating: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub director: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actors: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub awards: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation_reason: Option<String>,
}

impl From<MovieRecord> for MovieView {
    fn from(movie: MovieRecord) -> Self {
        Self {
            movie,
            poster_url: None,
            imdb_rating: None,
            director: None,
            actors: None,
            awards: None,
            recommendation_reason: None,
        }
    }
}

impl From<Recommendation> for MovieView {
    fn from(rec: Recommendation) -> Self {
        let mut view = MovieView::from(rec.movie);
        view.recommendation_reason = rec.reason;
        view
    }
}

impl MovieView {
    /// Copies enrichment fields onto the view
    pub fn apply_details(&mut self, details: &MovieDetails) {
        self.poster_url = details.poster.clone();
        self.imdb_rating = details.imdb_rating.clone();
        self.director = details.director.clone();
        self.actors = details.actors.clone();
        self.awards = details.awards.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_movie() -> MovieRecord {
        MovieRecord {
            id: 27205,
            imdb_id: Some("tt1375666".to_string()),
            title: "Inception".to_string(),
            overview: "A thief who steals corporate secrets".to_string(),
            genres: vec!["Action".to_string(), "Science Fiction".to_string()],
            keywords: vec!["dream".to_string()],
            cast: vec![],
            release_date: "2010-07-15".to_string(),
            vote_average: 8.3,
            vote_count: 14075,
            popularity: 167.58,
            runtime: 148,
        }
    }

    #[test]
    fn test_movie_view_omits_empty_enrichment() {
        let view = MovieView::from(sample_movie());
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["title"], "Inception");
        assert!(json.get("poster_url").is_none());
        assert!(json.get("recommendation_reason").is_none());
        assert!(json.get("cast").is_none());
    }

    #[test]
    fn test_movie_view_apply_details() {
        let mut view = MovieView::from(sample_movie());
        view.apply_details(&MovieDetails {
            poster: Some("https://img.omdbapi.com/inception.jpg".to_string()),
            imdb_rating: Some("8.8".to_string()),
            director: Some("Christopher Nolan".to_string()),
            ..Default::default()
        });

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["poster_url"], "https://img.omdbapi.com/inception.jpg");
        assert_eq!(json["imdb_rating"], "8.8");
        assert_eq!(json["director"], "Christopher Nolan");
        assert!(json.get("awards").is_none());
    }

    #[test]
    fn test_recommendation_flattens_movie_fields() {
        let rec = Recommendation::with_reason(sample_movie(), Some("Mind-bending".to_string()));
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["title"], "Inception");
        assert_eq!(json["reason"], "Mind-bending");
    }

    #[test]
    fn test_criterion_text() {
        assert_eq!(Criterion::Mood("happy".to_string()).text(), "happy");
        assert_eq!(Criterion::Genre("Drama".to_string()).text(), "Drama");
    }
}
