//! In-memory translation cache and usage statistics

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Number of keys reported by [`CacheStats::sample_keys`]
const SAMPLE_KEY_COUNT: usize = 5;

/// Identifies one memoized translation.
///
/// The source language only takes part when the client opts into
/// source-aware keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    text: String,
    target_lang: String,
    source_lang: Option<String>,
}

impl CacheKey {
    /// Key on text and target language only
    pub fn new(text: &str, target_lang: &str) -> Self {
        Self {
            text: text.to_string(),
            target_lang: target_lang.to_string(),
            source_lang: None,
        }
    }

    /// Key that also distinguishes the source language
    pub fn with_source(text: &str, target_lang: &str, source_lang: &str) -> Self {
        Self {
            source_lang: Some(source_lang.to_string()),
            ..Self::new(text, target_lang)
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source_lang {
            Some(source) => write!(f, "cai_{}_{}_{}", self.text, source, self.target_lang),
            None => write!(f, "cai_{}_{}", self.text, self.target_lang),
        }
    }
}

/// Snapshot returned by [`TranslationCache::stats`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    /// Stored entries
    pub cache_size: usize,
    /// Lookups, hits included
    pub total_translations: u64,
    /// Lookups answered from the cache
    pub cache_hits: u64,
    /// Lookups that went to the API
    pub api_calls: u64,
    /// Percentage of lookups answered from the cache
    pub hit_rate: f64,
    /// App name of the owning client
    pub app_name: String,
    /// Seconds since the cache was created
    pub uptime_seconds: f64,
    /// Oldest keys, in insertion order
    pub sample_keys: Vec<String>,
}

impl CacheStats {
    /// Hit rate with one decimal, e.g. `40.0%`
    pub fn hit_rate_display(&self) -> String {
        format!("{:.1}%", self.hit_rate)
    }
}

#[derive(Debug)]
struct CacheState {
    entries: HashMap<CacheKey, String>,
    insertion_order: Vec<CacheKey>,
    total_translations: u64,
    cache_hits: u64,
    api_calls: u64,
    started_at: DateTime<Utc>,
}

/// Unbounded memo of translated texts plus call counters
#[derive(Debug)]
pub struct TranslationCache {
    state: RwLock<CacheState>,
}

impl Default for TranslationCache {
    fn default() -> Self {
        Self::new()
    }
}

impl TranslationCache {
    /// Empty cache with zeroed counters
    pub fn new() -> Self {
        Self {
            state: RwLock::new(CacheState {
                entries: HashMap::new(),
                insertion_order: Vec::new(),
                total_translations: 0,
                cache_hits: 0,
                api_calls: 0,
                started_at: Utc::now(),
            }),
        }
    }

    /// Look up a translation and count the attempt.
    ///
    /// Every lookup counts towards the total; a miss also counts as an API
    /// call since the caller goes to the network next.
    pub async fn lookup(&self, key: &CacheKey) -> Option<String> {
        let mut state = self.state.write().await;
        state.total_translations += 1;

        match state.entries.get(key).cloned() {
            Some(hit) => {
                state.cache_hits += 1;
                debug!("Cache hit for {}", key);
                Some(hit)
            }
            None => {
                state.api_calls += 1;
                None
            }
        }
    }

    /// Store a translation fetched from the API
    pub async fn insert(&self, key: CacheKey, translation: String) {
        let mut state = self.state.write().await;
        if state.entries.insert(key.clone(), translation).is_none() {
            state.insertion_order.push(key);
        }
    }

    /// Drop every entry, keeping the counters
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        let removed = state.entries.len();
        state.entries.clear();
        state.insertion_order.clear();
        info!("Translation cache cleared ({} entries)", removed);
    }

    /// Number of stored entries
    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    /// Whether nothing is stored
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Snapshot of the counters, tagged with `app_name`
    pub async fn stats(&self, app_name: &str) -> CacheStats {
        let state = self.state.read().await;

        let hit_rate = if state.total_translations > 0 {
            state.cache_hits as f64 / state.total_translations as f64 * 100.0
        } else {
            0.0
        };

        let uptime = Utc::now() - state.started_at;
        let uptime_seconds = uptime
            .num_microseconds()
            .map(|micros| micros as f64 / 1_000_000.0)
            .unwrap_or_else(|| uptime.num_seconds() as f64);

        CacheStats {
            cache_size: state.entries.len(),
            total_translations: state.total_translations,
            cache_hits: state.cache_hits,
            api_calls: state.api_calls,
            hit_rate,
            app_name: app_name.to_string(),
            uptime_seconds,
            sample_keys: state
                .insertion_order
                .iter()
                .take(SAMPLE_KEY_COUNT)
                .map(ToString::to_string)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lookup_counts_hits_and_misses() {
        let cache = TranslationCache::new();
        let key = CacheKey::new("Hello", "es");

        assert!(cache.lookup(&key).await.is_none());
        cache.insert(key.clone(), "Hola".to_string()).await;
        assert_eq!(cache.lookup(&key).await.as_deref(), Some("Hola"));

        let stats = cache.stats("TestApp").await;
        assert_eq!(stats.total_translations, 2);
        assert_eq!(stats.cache_hits, 1);
        assert_eq!(stats.api_calls, 1);
        assert_eq!(stats.cache_size, 1);
        assert_eq!(stats.hit_rate_display(), "50.0%");
    }

    #[tokio::test]
    async fn test_source_language_is_not_part_of_default_key() {
        let cache = TranslationCache::new();
        cache.insert(CacheKey::new("Hello", "es"), "Hola".to_string()).await;

        // Same text and target collide regardless of the source language
        assert_eq!(
            cache.lookup(&CacheKey::new("Hello", "es")).await.as_deref(),
            Some("Hola")
        );
        assert!(cache
            .lookup(&CacheKey::with_source("Hello", "es", "de"))
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_sample_keys_keep_insertion_order() {
        let cache = TranslationCache::new();
        for word in ["one", "two", "three", "four", "five", "six"] {
            cache.insert(CacheKey::new(word, "fr"), word.to_uppercase()).await;
        }
        // Re-inserting must not duplicate the key
        cache.insert(CacheKey::new("one", "fr"), "UN".to_string()).await;

        let stats = cache.stats("TestApp").await;
        assert_eq!(stats.cache_size, 6);
        assert_eq!(
            stats.sample_keys,
            vec!["cai_one_fr", "cai_two_fr", "cai_three_fr", "cai_four_fr", "cai_five_fr"]
        );
    }

    #[tokio::test]
    async fn test_clear_keeps_counters() {
        let cache = TranslationCache::new();
        let key = CacheKey::new("Hello", "es");
        cache.lookup(&key).await;
        cache.insert(key, "Hola".to_string()).await;

        cache.clear().await;
        assert!(cache.is_empty().await);

        let stats = cache.stats("TestApp").await;
        assert_eq!(stats.total_translations, 1);
        assert!(stats.sample_keys.is_empty());
    }

    #[tokio::test]
    async fn test_empty_stats_have_zero_hit_rate() {
        let stats = TranslationCache::new().stats("TestApp").await;
        assert_eq!(stats.hit_rate, 0.0);
        assert_eq!(stats.hit_rate_display(), "0.0%");
        assert!(stats.uptime_seconds >= 0.0);
    }
}
