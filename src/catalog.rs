use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use rand::seq::index::sample;
use serde::{Deserialize, Deserializer};

use crate::error::{AppError, AppResult};
use crate::models::MovieRecord;

const MOVIES_FILE: &str = "tmdb_5000_movies.csv";
const CREDITS_FILE: &str = "tmdb_5000_credits.csv";

/// Minimum vote count for a movie to qualify as featured
const FEATURED_MIN_VOTES: i64 = 100;

/// Number of cast names surfaced on movie detail
const CAST_LIMIT: usize = 5;

/// In-memory movie store loaded once from the TMDB dataset.
///
/// All queries are plain filter/sort passes over the loaded records; the
/// store is read-only for the process lifetime.
pub struct MovieCatalog {
    movies: Vec<MovieRecord>,
    cast_by_movie: HashMap<i64, Vec<String>>,
}

/// Raw row shape of the movies CSV. Extra columns in the file are ignored;
/// numeric cells are coerced leniently so a blank or malformed value never
/// aborts the load.
#[derive(Debug, Deserialize)]
struct MovieRow {
    #[serde(default, deserialize_with = "lenient_i64")]
    id: i64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    original_title: Option<String>,
    #[serde(default)]
    overview: Option<String>,
    #[serde(default)]
    genres: Option<String>,
    #[serde(default)]
    keywords: Option<String>,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    vote_average: f64,
    #[serde(default, deserialize_with = "lenient_i64")]
    vote_count: i64,
    #[serde(default, deserialize_with = "lenient_f64")]
    popularity: f64,
    #[serde(default, deserialize_with = "lenient_i64")]
    runtime: i64,
}

/// Raw row shape of the credits CSV (cast table keyed by movie id)
#[derive(Debug, Deserialize)]
struct CreditsRow {
    #[serde(default, deserialize_with = "lenient_i64")]
    movie_id: i64,
    #[serde(default)]
    cast: Option<String>,
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw
        .and_then(|s| s.trim().parse::<f64>().ok())
        .unwrap_or(0.0))
}

fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw
        .and_then(|s| s.trim().parse::<f64>().ok())
        .unwrap_or(0.0) as i64)
}

/// Parses a JSON-encoded list of `{"name": ...}` objects into names.
/// Malformed cells yield an empty list, never an error.
fn parse_name_list(raw: Option<&str>) -> Vec<String> {
    #[derive(Deserialize)]
    struct Named {
        #[serde(default)]
        name: String,
    }

    let Some(raw) = raw else {
        return Vec::new();
    };
    if raw.is_empty() || raw == "[]" {
        return Vec::new();
    }

    match serde_json::from_str::<Vec<Named>>(raw) {
        Ok(items) => items
            .into_iter()
            .map(|n| n.name)
            .filter(|n| !n.is_empty())
            .collect(),
        Err(_) => Vec::new(),
    }
}

impl MovieCatalog {
    /// Loads the dataset from `data_dir`.
    ///
    /// The movies file is required; the credits file is optional. A missing
    /// or unreadable movies file is the only fatal startup condition.
    pub fn load(data_dir: impl AsRef<Path>) -> AppResult<Self> {
        let data_dir = data_dir.as_ref();

        let movies_path = data_dir.join(MOVIES_FILE);
        let file = std::fs::File::open(&movies_path).map_err(|e| {
            AppError::Dataset(format!("cannot open {}: {}", movies_path.display(), e))
        })?;
        let movies = Self::read_movies(file)?;
        tracing::info!(count = movies.len(), path = %movies_path.display(), "Loaded movies");

        let credits_path = data_dir.join(CREDITS_FILE);
        let cast_by_movie = match std::fs::File::open(&credits_path) {
            Ok(file) => {
                let cast = Self::read_credits(file)?;
                tracing::info!(count = cast.len(), "Loaded cast table");
                cast
            }
            Err(e) => {
                tracing::warn!(error = %e, path = %credits_path.display(), "Credits file unavailable, cast will be empty");
                HashMap::new()
            }
        };

        Ok(Self {
            movies,
            cast_by_movie,
        })
    }

    /// Builds a catalog directly from records (used by tests and tools)
    pub fn from_records(
        movies: Vec<MovieRecord>,
        cast_by_movie: HashMap<i64, Vec<String>>,
    ) -> Self {
        Self {
            movies,
            cast_by_movie,
        }
    }

    fn read_movies(reader: impl Read) -> AppResult<Vec<MovieRecord>> {
        let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

        let mut movies = Vec::new();
        for result in csv_reader.deserialize::<MovieRow>() {
            let row = match result {
                Ok(row) => row,
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping malformed movie row");
                    continue;
                }
            };
            if row.id == 0 {
                continue;
            }

            let title = row
                .title
                .filter(|t| !t.is_empty())
                .or(row.original_title)
                .unwrap_or_else(|| "Unknown".to_string());

            movies.push(MovieRecord {
                id: row.id,
                imdb_id: None,
                title,
                overview: row.overview.unwrap_or_default(),
                genres: parse_name_list(row.genres.as_deref()),
                keywords: parse_name_list(row.keywords.as_deref()),
                cast: Vec::new(),
                release_date: row.release_date.unwrap_or_default(),
                vote_average: row.vote_average,
                vote_count: row.vote_count,
                popularity: row.popularity,
                runtime: row.runtime,
            });
        }

        Ok(movies)
    }

    fn read_credits(reader: impl Read) -> AppResult<HashMap<i64, Vec<String>>> {
        let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);

        let mut cast_by_movie = HashMap::new();
        for result in csv_reader.deserialize::<CreditsRow>() {
            let row = match result {
                Ok(row) => row,
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping malformed credits row");
                    continue;
                }
            };
            if row.movie_id == 0 {
                continue;
            }

            let mut names = parse_name_list(row.cast.as_deref());
            names.truncate(CAST_LIMIT);
            cast_by_movie.insert(row.movie_id, names);
        }

        Ok(cast_by_movie)
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    /// First `limit` movies in dataset order
    pub fn all(&self, limit: usize) -> Vec<MovieRecord> {
        self.movies.iter().take(limit).cloned().collect()
    }

    /// Well-known movies: enough votes to trust the rating, ordered by
    /// popularity then rating
    pub fn featured(&self, limit: usize) -> Vec<MovieRecord> {
        let mut movies: Vec<&MovieRecord> = self
            .movies
            .iter()
            .filter(|m| m.vote_count > FEATURED_MIN_VOTES)
            .collect();
        movies.sort_by(|a, b| {
            b.popularity
                .total_cmp(&a.popularity)
                .then(b.vote_average.total_cmp(&a.vote_average))
        });
        movies.into_iter().take(limit).cloned().collect()
    }

    /// Case-insensitive title substring search
    pub fn search(&self, query: &str, limit: usize) -> Vec<MovieRecord> {
        if query.is_empty() {
            return Vec::new();
        }
        let query_lower = query.to_lowercase();
        self.movies
            .iter()
            .filter(|m| m.title.to_lowercase().contains(&query_lower))
            .take(limit)
            .cloned()
            .collect()
    }

    /// Movies with a genre containing `genre` (case-insensitive), best rated
    /// first
    pub fn by_genre(&self, genre: &str, limit: usize) -> Vec<MovieRecord> {
        let genre_lower = genre.to_lowercase();
        let mut movies: Vec<&MovieRecord> = self
            .movies
            .iter()
            .filter(|m| {
                m.genres
                    .iter()
                    .any(|g| g.to_lowercase().contains(&genre_lower))
            })
            .collect();
        movies.sort_by(|a, b| b.vote_average.total_cmp(&a.vote_average));
        movies.into_iter().take(limit).cloned().collect()
    }

    /// Single movie with cast names attached, or `None` for an unknown id
    pub fn by_id(&self, movie_id: i64) -> Option<MovieRecord> {
        let movie = self.movies.iter().find(|m| m.id == movie_id)?;
        let mut movie = movie.clone();
        if let Some(cast) = self.cast_by_movie.get(&movie_id) {
            movie.cast = cast.clone();
        }
        Some(movie)
    }

    /// Sorted, deduplicated genre names across the dataset
    pub fn genres(&self) -> Vec<String> {
        let mut genres: Vec<String> = self
            .movies
            .iter()
            .flat_map(|m| m.genres.iter().cloned())
            .collect();
        genres.sort();
        genres.dedup();
        genres
    }

    /// Uniform random pick of decently rated movies. When fewer than `count`
    /// movies clear the rating bar, samples from the whole dataset instead.
    pub fn random(&self, count: usize) -> Vec<MovieRecord> {
        let rated: Vec<&MovieRecord> = self
            .movies
            .iter()
            .filter(|m| m.vote_average > 5.0)
            .collect();

        let pool: Vec<&MovieRecord> = if rated.len() < count {
            self.movies.iter().collect()
        } else {
            rated
        };

        let amount = count.min(pool.len());
        let mut rng = rand::thread_rng();
        sample(&mut rng, pool.len(), amount)
            .into_iter()
            .map(|i| pool[i].clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie(id: i64, title: &str, genres: &[&str], rating: f64) -> MovieRecord {
        MovieRecord {
            id,
            title: title.to_string(),
            genres: genres.iter().map(|g| g.to_string()).collect(),
            vote_average: rating,
            vote_count: 500,
            popularity: id as f64,
            ..Default::default()
        }
    }

    fn test_catalog() -> MovieCatalog {
        MovieCatalog::from_records(
            vec![
                movie(1, "The Matrix", &["Action", "Science Fiction"], 8.1),
                movie(2, "Groundhog Day", &["Comedy", "Fantasy"], 7.8),
                movie(3, "Alien", &["Horror", "Science Fiction"], 8.0),
                movie(4, "Notting Hill", &["Romance", "Comedy"], 7.0),
            ],
            HashMap::from([(1, vec!["Keanu Reeves".to_string()])]),
        )
    }

    #[test]
    fn test_read_movies_coerces_bad_numbers() {
        let csv = "id,title,genres,vote_average,vote_count,popularity,runtime\n\
                   10,Broken Numbers,\"[{\"\"id\"\": 18, \"\"name\"\": \"\"Drama\"\"}]\",not-a-number,,8.5,\n";
        let movies = MovieCatalog::read_movies(csv.as_bytes()).unwrap();

        assert_eq!(movies.len(), 1);
        assert_eq!(movies[0].title, "Broken Numbers");
        assert_eq!(movies[0].genres, vec!["Drama".to_string()]);
        assert_eq!(movies[0].vote_average, 0.0);
        assert_eq!(movies[0].vote_count, 0);
        assert_eq!(movies[0].popularity, 8.5);
        assert_eq!(movies[0].runtime, 0);
    }

    #[test]
    fn test_read_movies_falls_back_to_original_title() {
        let csv = "id,title,original_title\n11,,Le Fabuleux Destin\n";
        let movies = MovieCatalog::read_movies(csv.as_bytes()).unwrap();
        assert_eq!(movies[0].title, "Le Fabuleux Destin");
    }

    #[test]
    fn test_parse_name_list_malformed_is_empty() {
        assert!(parse_name_list(Some("not json")).is_empty());
        assert!(parse_name_list(Some("")).is_empty());
        assert!(parse_name_list(None).is_empty());
        assert_eq!(
            parse_name_list(Some(r#"[{"id": 28, "name": "Action"}]"#)),
            vec!["Action".to_string()]
        );
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let catalog = test_catalog();
        let results = catalog.search("matrix", 10);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "The Matrix");
        assert!(catalog.search("", 10).is_empty());
    }

    #[test]
    fn test_by_genre_substring_and_rating_order() {
        let catalog = test_catalog();
        let results = catalog.by_genre("science", 10);
        assert_eq!(results.len(), 2);
        // Higher rated first
        assert_eq!(results[0].title, "The Matrix");
        assert_eq!(results[1].title, "Alien");
    }

    #[test]
    fn test_by_id_attaches_cast() {
        let catalog = test_catalog();
        let movie = catalog.by_id(1).unwrap();
        assert_eq!(movie.cast, vec!["Keanu Reeves".to_string()]);
        assert!(catalog.by_id(999).is_none());
    }

    #[test]
    fn test_genres_sorted_and_deduped() {
        let catalog = test_catalog();
        assert_eq!(
            catalog.genres(),
            vec![
                "Action",
                "Comedy",
                "Fantasy",
                "Horror",
                "Romance",
                "Science Fiction"
            ]
        );
    }

    #[test]
    fn test_featured_requires_votes() {
        let mut low_votes = movie(5, "Obscure", &["Drama"], 9.9);
        low_votes.vote_count = 3;
        let catalog = MovieCatalog::from_records(
            vec![low_votes, movie(6, "Blockbuster", &["Action"], 7.2)],
            HashMap::new(),
        );
        let featured = catalog.featured(10);
        assert_eq!(featured.len(), 1);
        assert_eq!(featured[0].title, "Blockbuster");
    }

    #[test]
    fn test_random_bounds() {
        let catalog = test_catalog();
        let picks = catalog.random(2);
        assert_eq!(picks.len(), 2);
        // More than available: returns everything without panicking
        let picks = catalog.random(50);
        assert_eq!(picks.len(), 4);
    }
}
