use std::collections::HashSet;

use rand::seq::index::sample;

use crate::models::MovieRecord;

/// Sample size used when building LLM prompts
pub const PROMPT_SAMPLE_SIZE: usize = 200;

/// Sample size used by the rule-based fallback
pub const FALLBACK_SAMPLE_SIZE: usize = 500;

const TOP_RATED: usize = 50;
const TOP_POPULAR: usize = 50;

/// Builds a bounded, deduplicated sample of the pool combining the best
/// rated entries, the most popular entries, and a uniform random fill from
/// the rest. First-seen order is preserved: top-rated first, then popular,
/// then random. Unseeded, so the random tail differs between calls.
pub fn diverse_sample(pool: &[MovieRecord], sample_size: usize) -> Vec<&MovieRecord> {
    if pool.len() <= sample_size {
        return pool.iter().collect();
    }

    let mut top_rated: Vec<&MovieRecord> =
        pool.iter().filter(|m| m.vote_average > 0.0).collect();
    top_rated.sort_by(|a, b| b.vote_average.total_cmp(&a.vote_average));
    top_rated.truncate(TOP_RATED);

    let mut top_popular: Vec<&MovieRecord> = pool.iter().collect();
    top_popular.sort_by(|a, b| b.popularity.total_cmp(&a.popularity));
    top_popular.truncate(TOP_POPULAR);

    let picked: HashSet<i64> = top_rated
        .iter()
        .chain(top_popular.iter())
        .map(|m| m.id)
        .collect();
    let remaining: Vec<&MovieRecord> =
        pool.iter().filter(|m| !picked.contains(&m.id)).collect();

    let fill = sample_size
        .saturating_sub(TOP_RATED + TOP_POPULAR)
        .min(remaining.len());
    let mut rng = rand::thread_rng();
    let random_fill = sample(&mut rng, remaining.len(), fill)
        .into_iter()
        .map(|i| remaining[i]);

    let mut seen = HashSet::new();
    let mut result = Vec::with_capacity(sample_size);
    for movie in top_rated
        .into_iter()
        .chain(top_popular)
        .chain(random_fill)
    {
        if seen.insert(movie.id) {
            result.push(movie);
        }
    }
    result.truncate(sample_size);
    result
}
