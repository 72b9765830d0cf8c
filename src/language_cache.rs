// Language list cache
// The active languages rarely change, so every page sharing one client reads them through a TTL cache

use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::api::ToursApi;
use crate::config::ClientConfig;
use crate::models::Language;

pub const ACTIVE_LANGUAGES_KEY: &str = "active_languages";

#[derive(Debug, Default)]
pub struct CacheStats {
    pub hit_count: AtomicUsize,
    pub miss_count: AtomicUsize,
    pub expired_count: AtomicUsize,
    pub store_count: AtomicUsize,
    pub invalidation_count: AtomicUsize,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStatsReport {
    pub hit_count: usize,
    pub miss_count: usize,
    pub expired_count: usize,
    pub store_count: usize,
    pub invalidation_count: usize,
}

pub trait LanguageCache: Send + Sync + 'static {
    // Fresh entry only; an expired one counts as a miss
    fn get(&self) -> Option<Vec<Language>>;

    // Whatever is stored, expired or not
    fn get_stale(&self) -> Option<Vec<Language>>;

    fn set(&self, languages: Vec<Language>);

    // True when nothing is stored or the stored entry has outlived its TTL
    fn is_expired(&self) -> bool;

    fn invalidate(&self);

    fn stats(&self) -> CacheStatsReport;
}

struct CacheEntry {
    languages: Vec<Language>,
    stored_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        self.stored_at.elapsed() >= self.ttl
    }
}

pub struct MemoryLanguageCache {
    entries: DashMap<&'static str, CacheEntry>,
    ttl: Duration,
    stats: CacheStats,
}

impl MemoryLanguageCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            stats: CacheStats::default(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.language_cache_ttl())
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl Default for MemoryLanguageCache {
    fn default() -> Self {
        Self::from_config(&ClientConfig::default())
    }
}

impl LanguageCache for MemoryLanguageCache {
    fn get(&self) -> Option<Vec<Language>> {
        match self.entries.get(ACTIVE_LANGUAGES_KEY) {
            Some(entry) if !entry.is_expired() => {
                self.stats.hit_count.fetch_add(1, Ordering::SeqCst);
                Some(entry.languages.clone())
            }
            Some(_) => {
                self.stats.expired_count.fetch_add(1, Ordering::SeqCst);
                self.stats.miss_count.fetch_add(1, Ordering::SeqCst);
                None
            }
            None => {
                self.stats.miss_count.fetch_add(1, Ordering::SeqCst);
                None
            }
        }
    }

    fn get_stale(&self) -> Option<Vec<Language>> {
        self.entries
            .get(ACTIVE_LANGUAGES_KEY)
            .map(|entry| entry.languages.clone())
    }

    fn set(&self, languages: Vec<Language>) {
        self.entries.insert(
            ACTIVE_LANGUAGES_KEY,
            CacheEntry {
                languages,
                stored_at: Instant::now(),
                ttl: self.ttl,
            },
        );
        self.stats.store_count.fetch_add(1, Ordering::SeqCst);
    }

    fn is_expired(&self) -> bool {
        self.entries
            .get(ACTIVE_LANGUAGES_KEY)
            .map_or(true, |entry| entry.is_expired())
    }

    fn invalidate(&self) {
        if self.entries.remove(ACTIVE_LANGUAGES_KEY).is_some() {
            self.stats.invalidation_count.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn stats(&self) -> CacheStatsReport {
        CacheStatsReport {
            hit_count: self.stats.hit_count.load(Ordering::SeqCst),
            miss_count: self.stats.miss_count.load(Ordering::SeqCst),
            expired_count: self.stats.expired_count.load(Ordering::SeqCst),
            store_count: self.stats.store_count.load(Ordering::SeqCst),
            invalidation_count: self.stats.invalidation_count.load(Ordering::SeqCst),
        }
    }
}

/// Read-through access to the active languages.
///
/// Never fails: a failed fetch serves the last stored list even when it has expired,
/// and with nothing stored falls back to [`Language::builtin`].
pub struct ActiveLanguages<C: LanguageCache = MemoryLanguageCache> {
    api: Arc<dyn ToursApi>,
    cache: C,
}

impl<C: LanguageCache> ActiveLanguages<C> {
    pub fn new(api: Arc<dyn ToursApi>, cache: C) -> Self {
        Self { api, cache }
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub async fn get(&self) -> Vec<Language> {
        if let Some(languages) = self.cache.get() {
            return languages;
        }
        self.refresh().await
    }

    // Skips the cache read; used after an admin edits the language list
    pub async fn refresh(&self) -> Vec<Language> {
        match self.api.languages(true).await {
            Ok(languages) => {
                debug!(count = languages.len(), "active languages refreshed");
                self.cache.set(languages.clone());
                languages
            }
            Err(err) => match self.cache.get_stale() {
                Some(stale) => {
                    warn!(error = %err, "language fetch failed, serving expired list");
                    stale
                }
                None => {
                    warn!(error = %err, "language fetch failed, using built-in languages");
                    Language::builtin()
                }
            },
        }
    }

    pub async fn default_code(&self) -> String {
        let languages = self.get().await;
        languages
            .iter()
            .find(|l| l.is_default)
            .or_else(|| languages.first())
            .map(|l| l.code.clone())
            .unwrap_or_else(|| "en".to_string())
    }
}
