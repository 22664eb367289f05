//! Application state shared across HTTP handlers
//!
//! This module provides the AppState struct and its implementations.

use crate::config::Config;
use crate::core::cache::AnalysisCache;
use crate::core::generator::AnalysisGenerator;
use crate::core::policy::RateLimitPolicy;
use crate::storage::{CacheStore, MemoryStore};
use crate::utils::error::Result;
use std::sync::Arc;

/// HTTP server state shared across handlers
///
/// All fields are wrapped in Arc for efficient sharing across worker
/// threads. There is no other cross-request mutable state: everything a
/// request touches lives behind the cache store or the rate-limit counters.
#[derive(Clone)]
pub struct AppState {
    /// Gateway configuration (shared read-only)
    pub config: Arc<Config>,
    /// Pattern-keyed analysis cache
    pub cache: Arc<AnalysisCache>,
    /// LLM-backed generator with rule-based fallback
    pub generator: Arc<AnalysisGenerator>,
    /// Per-pattern rate limiting
    pub rate_limit: Arc<RateLimitPolicy>,
}

impl AppState {
    /// Create a new AppState backed by the in-memory cache store
    pub fn new(config: Config) -> Result<Self> {
        Self::with_store(config, Arc::new(MemoryStore::new()))
    }

    /// Create a new AppState over an externally supplied cache store
    pub fn with_store(config: Config, store: Arc<dyn CacheStore>) -> Result<Self> {
        let cache = AnalysisCache::new(
            store,
            config.cache().ttl_secs,
            config.cache().enabled,
        );
        let generator = AnalysisGenerator::from_config(config.llm())?;
        let rate_limit = RateLimitPolicy::new(&config.policy().rate_limit);

        Ok(Self {
            config: Arc::new(config),
            cache: Arc::new(cache),
            generator: Arc::new(generator),
            rate_limit: Arc::new(rate_limit),
        })
    }

    /// Get gateway configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}
