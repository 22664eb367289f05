//! In-memory cache store
//!
//! DashMap-backed implementation of [`CacheStore`]. Expired entries are left
//! in place and only reclaimed by an opportunistic sweep on writes, so reads
//! never observe eviction-related latency.

use super::CacheStore;
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;

/// Sweep cadence: every N writes, drop entries past their expiry hint
const SWEEP_INTERVAL: usize = 256;

#[derive(Debug, Clone)]
struct StoredValue {
    value: String,
    expires_at: DateTime<Utc>,
}

/// In-memory [`CacheStore`] implementation
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, StoredValue>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop entries whose expiry hint has passed
    fn sweep_expired(&self) {
        let now = Utc::now();
        let before = self.entries.len();
        self.entries.retain(|_, stored| stored.expires_at > now);
        let removed = before - self.entries.len();
        if removed > 0 {
            debug!(removed, "swept expired cache entries");
        }
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).map(|stored| stored.value.clone()))
    }

    async fn put(&self, key: &str, value: &str, expires_at: DateTime<Utc>) -> Result<()> {
        self.entries.insert(
            key.to_string(),
            StoredValue {
                value: value.to_string(),
                expires_at,
            },
        );
        if self.entries.len() % SWEEP_INTERVAL == 0 {
            self.sweep_expired();
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }

    async fn len(&self) -> usize {
        self.entries.len()
    }
}
