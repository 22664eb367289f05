//! Storage layer
//!
//! The cache persists through an injectable key-value interface so the
//! gateway, the SDK mirror, and tests can share one contract. The bundled
//! implementation is in-memory; a deployment can substitute a hosted KV
//! store without touching the cache logic.

pub mod memory;

pub use memory::MemoryStore;

use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Key-value store with TTL semantics.
///
/// `get` returns whatever is stored, including entries past their expiry -
/// the expiry *predicate* belongs to the caller (expired rows are inert, not
/// actively evicted). `expires_at` is a hint the store may use to reclaim
/// space.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetch the raw value for a key, if present
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store a value, replacing any previous one (last-write-wins)
    async fn put(&self, key: &str, value: &str, expires_at: DateTime<Utc>) -> Result<()>;

    /// Remove a key; absent keys are not an error
    async fn delete(&self, key: &str) -> Result<()>;

    /// Number of stored entries, expired ones included
    async fn len(&self) -> usize;
}
