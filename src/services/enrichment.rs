use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use crate::db::{EnrichmentStore, StoredEnrichment};
use crate::models::{MovieDetails, MovieView};
use crate::services::omdb::{DetailLookup, DetailQuery};

/// Age after which a cached enrichment record is treated as absent
const CACHE_TTL_HOURS: i64 = 24;

/// Key into both enrichment cache tiers.
///
/// The IMDb id is preferred when known; otherwise the lower-cased title is
/// used. The two namespaces are deliberately not reconciled: a movie known
/// under both handles forms two independent entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Imdb(String),
    Title(String),
}

impl CacheKey {
    pub fn for_movie(title: Option<&str>, imdb_id: Option<&str>) -> Option<Self> {
        if let Some(id) = imdb_id {
            Some(CacheKey::Imdb(id.to_string()))
        } else {
            title.map(|t| CacheKey::Title(t.to_string()))
        }
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Imdb(id) => write!(f, "imdb:{}", id),
            CacheKey::Title(title) => write!(f, "title:{}", title.to_lowercase()),
        }
    }
}

/// Memory-tier entry; `details: None` is a negative entry marking a
/// confirmed "not found" so repeated misses skip the durable tier.
#[derive(Clone)]
struct MemoryEntry {
    details: Option<MovieDetails>,
    cached_at: DateTime<Utc>,
}

/// Two-tier, best-effort enrichment cache.
///
/// Lookup order is memory tier, durable tier, then one external call. Fresh
/// results are written back to both tiers; durable writes are
/// fire-and-forget. No failure here is ever surfaced to the caller:
/// enrichment degrades to "absent".
#[derive(Clone)]
pub struct EnrichmentService {
    memory: Arc<RwLock<HashMap<String, MemoryEntry>>>,
    store: Arc<dyn EnrichmentStore>,
    lookup: Option<Arc<dyn DetailLookup>>,
    ttl: Duration,
}

impl EnrichmentService {
    /// Builds the service. A `None` lookup backend disables external calls;
    /// cache tiers are still consulted.
    pub fn new(store: Arc<dyn EnrichmentStore>, lookup: Option<Arc<dyn DetailLookup>>) -> Self {
        Self {
            memory: Arc::new(RwLock::new(HashMap::new())),
            store,
            lookup,
            ttl: Duration::hours(CACHE_TTL_HOURS),
        }
    }

    /// Overrides the TTL (tests use this to force expiry)
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Fetches enrichment data for a movie known by title and/or IMDb id.
    ///
    /// Returns `None` when the movie has no usable key, the backend reports
    /// it unknown, or any tier fails; callers proceed without enrichment.
    pub async fn fetch(
        &self,
        title: Option<&str>,
        imdb_id: Option<&str>,
    ) -> Option<MovieDetails> {
        let key = CacheKey::for_movie(title, imdb_id)?;
        let key_str = key.to_string();
        let now = Utc::now();

        // Memory tier
        {
            let memory = self.memory.read().await;
            if let Some(entry) = memory.get(&key_str) {
                if now - entry.cached_at < self.ttl {
                    tracing::debug!(key = %key_str, "Memory cache hit");
                    return entry.details.clone();
                }
            }
        }

        // Durable tier
        match self.store.get(&key_str).await {
            Ok(Some(row)) if now - row.cached_at < self.ttl => {
                tracing::debug!(key = %key_str, "Durable cache hit");
                let details = row.to_details();
                self.remember(&key_str, Some(details.clone())).await;
                return Some(details);
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(key = %key_str, error = %e, "Durable cache read failed");
            }
        }

        // External lookup
        let lookup = self.lookup.as_ref()?;
        let query = match (imdb_id, title) {
            (Some(id), _) => DetailQuery::ImdbId(id.to_string()),
            (None, Some(t)) => DetailQuery::Title(t.to_string()),
            (None, None) => return None,
        };

        match lookup.lookup(&query).await {
            Ok(Some(details)) => {
                self.remember(&key_str, Some(details.clone())).await;
                self.persist(&key_str, &details);
                Some(details)
            }
            Ok(None) => {
                // Negative entry in the memory tier only
                self.remember(&key_str, None).await;
                None
            }
            Err(e) => {
                tracing::error!(key = %key_str, error = %e, "Detail lookup failed");
                None
            }
        }
    }

    /// Convenience for poster-only enrichment
    pub async fn poster_url(&self, title: &str) -> Option<String> {
        self.fetch(Some(title), None).await.and_then(|d| d.poster)
    }

    /// Decorates a view with enrichment data when available
    pub async fn enrich(&self, view: &mut MovieView) {
        let imdb_id = view.movie.imdb_id.clone();
        if let Some(details) = self.fetch(Some(&view.movie.title), imdb_id.as_deref()).await {
            view.apply_details(&details);
        }
    }

    async fn remember(&self, key: &str, details: Option<MovieDetails>) {
        let mut memory = self.memory.write().await;
        memory.insert(
            key.to_string(),
            MemoryEntry {
                details,
                cached_at: Utc::now(),
            },
        );
    }

    /// Fire-and-forget durable write; failures are logged and swallowed
    fn persist(&self, key: &str, details: &MovieDetails) {
        let store = Arc::clone(&self.store);
        let record = StoredEnrichment::from_details(key, details);
        tokio::spawn(async move {
            if let Err(e) = store.upsert(&record).await {
                tracing::warn!(key = %record.cache_key, error = %e, "Durable cache write failed");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::enrichment_store::MockEnrichmentStore;
    use crate::error::AppError;
    use crate::services::omdb::MockDetailLookup;

    fn details(title: &str) -> MovieDetails {
        MovieDetails {
            title: Some(title.to_string()),
            poster: Some(format!("https://posters.example/{}.jpg", title)),
            imdb_rating: Some("8.0".to_string()),
            ..Default::default()
        }
    }

    fn service(
        store: MockEnrichmentStore,
        lookup: Option<MockDetailLookup>,
    ) -> EnrichmentService {
        EnrichmentService::new(
            Arc::new(store),
            lookup.map(|l| Arc::new(l) as Arc<dyn DetailLookup>),
        )
    }

    #[test]
    fn test_cache_key_prefers_imdb_id() {
        let key = CacheKey::for_movie(Some("Inception"), Some("tt1375666")).unwrap();
        assert_eq!(key.to_string(), "imdb:tt1375666");

        let key = CacheKey::for_movie(Some("Inception"), None).unwrap();
        assert_eq!(key.to_string(), "title:inception");

        assert!(CacheKey::for_movie(None, None).is_none());
    }

    #[tokio::test]
    async fn test_fetch_memoizes_within_ttl() {
        let mut store = MockEnrichmentStore::new();
        store.expect_get().times(1).returning(|_| Ok(None));
        store.expect_upsert().returning(|_| Ok(()));

        let mut lookup = MockDetailLookup::new();
        lookup
            .expect_lookup()
            .times(1)
            .returning(|_| Ok(Some(details("Inception"))));

        let service = service(store, Some(lookup));

        let first = service.fetch(Some("Inception"), None).await;
        let second = service.fetch(Some("Inception"), None).await;

        assert_eq!(first, Some(details("Inception")));
        assert_eq!(second, first);
    }

    #[tokio::test]
    async fn test_fetch_after_ttl_reissues_lookup() {
        let mut store = MockEnrichmentStore::new();
        store.expect_get().times(2).returning(|_| Ok(None));
        store.expect_upsert().returning(|_| Ok(()));

        let mut lookup = MockDetailLookup::new();
        lookup
            .expect_lookup()
            .times(2)
            .returning(|_| Ok(Some(details("Inception"))));

        let service = service(store, Some(lookup)).with_ttl(Duration::zero());

        assert!(service.fetch(Some("Inception"), None).await.is_some());
        assert!(service.fetch(Some("Inception"), None).await.is_some());
    }

    #[tokio::test]
    async fn test_not_found_is_negatively_cached_in_memory_only() {
        let mut store = MockEnrichmentStore::new();
        store.expect_get().times(1).returning(|_| Ok(None));

        let mut lookup = MockDetailLookup::new();
        lookup.expect_lookup().times(1).returning(|_| Ok(None));

        let service = service(store, Some(lookup));

        // Second call is served by the negative memory entry: neither the
        // store nor the backend sees it.
        assert!(service.fetch(Some("No Such Movie"), None).await.is_none());
        assert!(service.fetch(Some("No Such Movie"), None).await.is_none());
    }

    #[tokio::test]
    async fn test_durable_hit_populates_memory_and_skips_lookup() {
        let mut store = MockEnrichmentStore::new();
        store.expect_get().times(1).returning(|key| {
            Ok(Some(StoredEnrichment::from_details(
                key,
                &details("Inception"),
            )))
        });

        // No lookup expectation: a backend call would panic the test
        let mut lookup = MockDetailLookup::new();
        lookup.expect_lookup().times(0);

        let service = service(store, Some(lookup));

        let first = service.fetch(Some("Inception"), None).await.unwrap();
        assert_eq!(first.poster, details("Inception").poster);

        // Now served from memory
        let second = service.fetch(Some("Inception"), None).await.unwrap();
        assert_eq!(second.poster, first.poster);
    }

    #[tokio::test]
    async fn test_transport_failure_is_not_cached() {
        let mut store = MockEnrichmentStore::new();
        store.expect_get().times(2).returning(|_| Ok(None));

        let mut lookup = MockDetailLookup::new();
        lookup
            .expect_lookup()
            .times(2)
            .returning(|_| Err(AppError::ExternalApi("timeout".to_string())));

        let service = service(store, Some(lookup));

        // Both calls reach the backend: failures leave no cache entry
        assert!(service.fetch(Some("Inception"), None).await.is_none());
        assert!(service.fetch(Some("Inception"), None).await.is_none());
    }

    #[tokio::test]
    async fn test_store_write_failure_does_not_fail_fetch() {
        let mut store = MockEnrichmentStore::new();
        store.expect_get().returning(|_| Ok(None));
        store
            .expect_upsert()
            .returning(|_| Err(AppError::Internal("disk full".to_string())));

        let mut lookup = MockDetailLookup::new();
        lookup
            .expect_lookup()
            .returning(|_| Ok(Some(details("Inception"))));

        let service = service(store, Some(lookup));

        assert!(service.fetch(Some("Inception"), None).await.is_some());
    }

    #[tokio::test]
    async fn test_no_backend_returns_absent_without_caching() {
        let mut store = MockEnrichmentStore::new();
        store.expect_get().times(2).returning(|_| Ok(None));

        let service = service(store, None);

        assert!(service.fetch(Some("Inception"), None).await.is_none());
        // Nothing was cached, so the durable tier is consulted again
        assert!(service.fetch(Some("Inception"), None).await.is_none());
    }

    #[tokio::test]
    async fn test_no_key_returns_absent_immediately() {
        let store = MockEnrichmentStore::new();
        let service = service(store, None);
        assert!(service.fetch(None, None).await.is_none());
    }
}
