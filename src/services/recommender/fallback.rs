use std::collections::HashSet;

use crate::models::{Criterion, MovieRecord, Recommendation};
use crate::services::recommender::sampling::{diverse_sample, FALLBACK_SAMPLE_SIZE};
use crate::services::recommender::Recommender;

/// Ordered mood keyword → genre mapping. Matching is first-substring-match
/// over this declaration order; an input containing several keywords
/// resolves to the earliest entry. Consumers rely on this exact behavior,
/// so the order here must not be "fixed".
const MOOD_GENRES: &[(&str, &[&str])] = &[
    ("happy", &["Comedy", "Family", "Animation", "Musical"]),
    ("excited", &["Action", "Adventure", "Thriller", "Science Fiction"]),
    ("relaxed", &["Romance", "Drama", "Music"]),
    ("adventurous", &["Adventure", "Action", "Fantasy", "Science Fiction"]),
    ("scared", &["Horror", "Thriller", "Mystery"]),
    ("romantic", &["Romance", "Drama"]),
    ("thoughtful", &["Drama", "Documentary", "History"]),
    ("nostalgic", &["Family", "Animation", "Comedy"]),
    ("sad", &["Drama", "Romance"]),
    ("funny", &["Comedy", "Animation"]),
    ("inspiring", &["Drama", "Biography", "History"]),
    ("curious", &["Mystery", "Science Fiction", "Documentary"]),
];

const DEFAULT_GENRES: &[&str] = &["Drama", "Comedy", "Action"];

/// Rule-based recommendation provider; always available, used directly when
/// no LLM backend is configured and as the landing spot when the backend
/// call fails.
#[derive(Debug, Clone, Default)]
pub struct FallbackRecommender;

impl FallbackRecommender {
    pub fn new() -> Self {
        Self
    }

    /// First mood keyword (in declaration order) contained in the input, or
    /// the default genre set
    fn genres_for_mood(mood: &str) -> &'static [&'static str] {
        let mood_lower = mood.to_lowercase();
        for (keyword, genres) in MOOD_GENRES {
            if mood_lower.contains(keyword) {
                return genres;
            }
        }
        DEFAULT_GENRES
    }

    /// Mood selection: exact genre membership against the mapped genre set,
    /// rating-descending, padded to `limit` from the sample in sample order
    fn mood_picks(&self, mood: &str, pool: &[MovieRecord], limit: usize) -> Vec<Recommendation> {
        let genres = Self::genres_for_mood(mood);
        let sample = diverse_sample(pool, FALLBACK_SAMPLE_SIZE);

        let mut picks: Vec<&MovieRecord> = sample
            .iter()
            .copied()
            .filter(|m| m.genres.iter().any(|g| genres.contains(&g.as_str())))
            .collect();
        picks.sort_by(|a, b| b.vote_average.total_cmp(&a.vote_average));
        picks.truncate(limit);

        if picks.len() < limit {
            let chosen: HashSet<i64> = picks.iter().map(|m| m.id).collect();
            for movie in sample.iter().copied() {
                if picks.len() >= limit {
                    break;
                }
                if !chosen.contains(&movie.id) {
                    picks.push(movie);
                }
            }
        }

        picks
            .into_iter()
            .map(|m| Recommendation::new(m.clone()))
            .collect()
    }

    /// Genre selection: case-insensitive substring match, rating-descending.
    /// No padding; may return fewer than `limit`.
    fn genre_picks(&self, genre: &str, pool: &[MovieRecord], limit: usize) -> Vec<Recommendation> {
        let genre_lower = genre.to_lowercase();
        let sample = diverse_sample(pool, FALLBACK_SAMPLE_SIZE);

        let mut picks: Vec<&MovieRecord> = sample
            .iter()
            .copied()
            .filter(|m| {
                m.genres
                    .iter()
                    .any(|g| g.to_lowercase().contains(&genre_lower))
            })
            .collect();
        picks.sort_by(|a, b| b.vote_average.total_cmp(&a.vote_average));
        picks.truncate(limit);

        picks
            .into_iter()
            .map(|m| Recommendation::new(m.clone()))
            .collect()
    }
}

#[async_trait::async_trait]
impl Recommender for FallbackRecommender {
    async fn propose(
        &self,
        criterion: &Criterion,
        pool: &[MovieRecord],
        limit: usize,
    ) -> Vec<Recommendation> {
        match criterion {
            Criterion::Mood(mood) => self.mood_picks(mood, pool, limit),
            Criterion::Genre(genre) => self.genre_picks(genre, pool, limit),
        }
    }
}
