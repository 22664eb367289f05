//! Request policies
//!
//! The rate-limit scaffold tracks a count and a reset window per key. The
//! original deployment shipped with this switched off; here it is an
//! explicit, configurable policy (default enabled) so the integrator makes
//! that call instead of the code.

use crate::config::RateLimitConfig;
use crate::utils::error::AnalysisFailure;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

#[derive(Debug, Clone, Copy)]
struct WindowSlot {
    count: u32,
    window_start: DateTime<Utc>,
}

/// Fixed-window rate limiter keyed by an arbitrary string (pattern
/// fingerprint on the server, coarse cache key in the SDK).
#[derive(Debug)]
pub struct RateLimitPolicy {
    enabled: bool,
    max_requests: u32,
    window: Duration,
    counters: DashMap<String, WindowSlot>,
}

impl RateLimitPolicy {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            enabled: config.enabled,
            max_requests: config.max_requests,
            window: Duration::seconds(config.window_secs as i64),
            counters: DashMap::new(),
        }
    }

    /// Disabled policy that admits everything
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            max_requests: 0,
            window: Duration::seconds(0),
            counters: DashMap::new(),
        }
    }

    /// Admit or reject a request for this key
    pub fn check(&self, key: &str) -> Result<(), AnalysisFailure> {
        self.check_at(key, Utc::now())
    }

    fn check_at(&self, key: &str, now: DateTime<Utc>) -> Result<(), AnalysisFailure> {
        if !self.enabled {
            return Ok(());
        }

        let mut slot = self
            .counters
            .entry(key.to_string())
            .or_insert(WindowSlot {
                count: 0,
                window_start: now,
            });

        if now - slot.window_start >= self.window {
            slot.count = 0;
            slot.window_start = now;
        }

        if slot.count >= self.max_requests {
            let elapsed = now - slot.window_start;
            let retry_after_secs = (self.window - elapsed).num_seconds().max(0) as u64;
            return Err(AnalysisFailure::RateLimited {
                key: key.to_string(),
                retry_after_secs,
            });
        }

        slot.count += 1;
        Ok(())
    }
}
