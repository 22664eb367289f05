//! Pattern-keyed analysis cache
//!
//! Persists one [`AnalysisResult`] per pattern fingerprint with a fixed TTL.
//! Reads apply the `expires_at` predicate; expired rows stay in storage and
//! simply stop matching. Store failures are logged and downgraded - a
//! freshly generated analysis is always worth returning even when the write
//! behind it fails.

use crate::core::pattern::PatternKey;
use crate::core::result::AnalysisResult;
use crate::core::types::AssessmentType;
use crate::storage::CacheStore;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

/// Persisted cache row, matching the logical table
/// `(input_hash PK, assessment_type, analysis_data, model_used,
/// processing_time_ms, cache_hits, created_at, expires_at)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub input_hash: String,
    pub assessment_type: AssessmentType,
    pub analysis_data: AnalysisResult,
    pub model_used: String,
    pub processing_time_ms: u64,
    pub cache_hits: u64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// A successful cache lookup
#[derive(Debug, Clone)]
pub struct CacheHit {
    /// The stored analysis, returned verbatim
    pub analysis: AnalysisResult,
    /// Hit count including this lookup
    pub cache_hits: u64,
}

/// Lock-free counters for the hot path
#[derive(Debug, Default)]
struct AtomicCacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    expired: AtomicU64,
    stores: AtomicU64,
    store_failures: AtomicU64,
}

/// Cache statistics snapshot
#[derive(Debug, Default, Clone, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Lookups that found a row past its expiry
    pub expired: u64,
    pub stores: u64,
    pub store_failures: u64,
    pub entries: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Analysis cache keyed by pattern fingerprint
pub struct AnalysisCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
    enabled: bool,
    stats: AtomicCacheStats,
}

impl AnalysisCache {
    /// Create a cache over the given store with a TTL in seconds
    pub fn new(store: Arc<dyn CacheStore>, ttl_secs: u64, enabled: bool) -> Self {
        Self {
            store,
            ttl: Duration::seconds(ttl_secs as i64),
            enabled,
            stats: AtomicCacheStats::default(),
        }
    }

    /// Look up a non-expired analysis for this pattern.
    ///
    /// On hit the stored hit counter is incremented best-effort: a failure
    /// to persist the increment must never fail the read.
    pub async fn lookup(&self, key: &PatternKey) -> Option<CacheHit> {
        if !self.enabled {
            return None;
        }

        let fingerprint = key.fingerprint();
        let raw = match self.store.get(&fingerprint).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                debug!(%fingerprint, "cache miss");
                return None;
            }
            Err(e) => {
                // Infrastructure failure reads as a miss
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                warn!(%fingerprint, error = %e, "cache read failed, treating as miss");
                return None;
            }
        };

        let mut entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                warn!(%fingerprint, error = %e, "corrupt cache entry, treating as miss");
                return None;
            }
        };

        if entry.expires_at <= Utc::now() {
            self.stats.expired.fetch_add(1, Ordering::Relaxed);
            self.stats.misses.fetch_add(1, Ordering::Relaxed);
            debug!(%fingerprint, "cache entry expired");
            return None;
        }

        entry.cache_hits += 1;
        match serde_json::to_string(&entry) {
            Ok(updated) => {
                if let Err(e) = self
                    .store
                    .put(&fingerprint, &updated, entry.expires_at)
                    .await
                {
                    warn!(%fingerprint, error = %e, "failed to persist hit counter");
                }
            }
            Err(e) => warn!(%fingerprint, error = %e, "failed to serialize hit counter"),
        }

        self.stats.hits.fetch_add(1, Ordering::Relaxed);
        debug!(%fingerprint, hits = entry.cache_hits, "cache hit");

        Some(CacheHit {
            analysis: entry.analysis_data,
            cache_hits: entry.cache_hits,
        })
    }

    /// Store a freshly generated analysis under this pattern.
    ///
    /// Write failures are logged and swallowed; concurrent writers for the
    /// same fingerprint resolve last-write-wins.
    pub async fn store(&self, key: &PatternKey, analysis: &AnalysisResult) {
        if !self.enabled {
            return;
        }

        let fingerprint = key.fingerprint();
        let now = Utc::now();
        let entry = CacheEntry {
            input_hash: fingerprint.clone(),
            assessment_type: key.assessment_type,
            analysis_data: analysis.clone(),
            model_used: analysis.model.clone(),
            processing_time_ms: analysis.processing_time_ms,
            cache_hits: 0,
            created_at: now,
            expires_at: now + self.ttl,
        };

        let raw = match serde_json::to_string(&entry) {
            Ok(raw) => raw,
            Err(e) => {
                self.stats.store_failures.fetch_add(1, Ordering::Relaxed);
                warn!(%fingerprint, error = %e, "failed to serialize cache entry");
                return;
            }
        };

        match self.store.put(&fingerprint, &raw, entry.expires_at).await {
            Ok(()) => {
                self.stats.stores.fetch_add(1, Ordering::Relaxed);
                debug!(%fingerprint, "cached analysis");
            }
            Err(e) => {
                self.stats.store_failures.fetch_add(1, Ordering::Relaxed);
                warn!(%fingerprint, error = %e, "cache write failed, returning uncached result");
            }
        }
    }

    /// Snapshot of the counters plus the current store size
    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.stats.hits.load(Ordering::Relaxed),
            misses: self.stats.misses.load(Ordering::Relaxed),
            expired: self.stats.expired.load(Ordering::Relaxed),
            stores: self.stats.stores.load(Ordering::Relaxed),
            store_failures: self.stats.store_failures.load(Ordering::Relaxed),
            entries: self.store.len().await,
        }
    }
}
