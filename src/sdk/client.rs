//! Analysis client
//!
//! Client-side mirror of the gateway pipeline: a coarse local cache in
//! front of the HTTP call, a bounded retry budget surfaced to the caller,
//! a rate-limit scaffold, and the shared rule-based synthesizer as the
//! terminal fallback. The caller always ends a request with either a valid
//! analysis or a typed, retry-labelled error - never a raw exception.

use crate::config::RateLimitConfig;
use crate::core::fallback;
use crate::core::policy::RateLimitPolicy;
use crate::core::result::AnalysisResult;
use crate::core::types::AnalysisInput;
use crate::sdk::session::{AnalysisSession, SessionState};
use crate::storage::{CacheStore, MemoryStore};
use crate::utils::error::AnalysisFailure;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the analysis gateway
    pub gateway_url: String,
    /// Hard deadline for one gateway call
    pub timeout_secs: u64,
    /// Retry budget; once `retry_count` reaches this, retry is no longer
    /// offered and the client falls back to the synthesizer
    pub retry_limit: u32,
    /// TTL of the local coarse-keyed cache
    pub cache_ttl_secs: u64,
    /// Client-side rate limiting, keyed like the cache
    pub rate_limit: RateLimitConfig,
    /// Reject a second request while one is still in flight
    pub dedupe_in_flight: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            gateway_url: "http://127.0.0.1:8080".to_string(),
            timeout_secs: 10,
            retry_limit: 3,
            cache_ttl_secs: 3600,
            rate_limit: RateLimitConfig::default(),
            dedupe_in_flight: true,
        }
    }
}

/// Errors surfaced to the client's caller
#[derive(Error, Debug)]
pub enum ClientError {
    /// Client could not be constructed
    #[error("client configuration error: {0}")]
    Config(String),

    /// The submission failed validation; never sent over the network
    #[error("invalid input: {0}")]
    Invalid(String),

    /// Another request is in flight and deduplication is enabled
    #[error("an analysis request is already in flight")]
    InFlight,

    /// The client-side rate limiter rejected the request
    #[error("rate limit exceeded, window resets in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// The gateway call failed but another attempt may succeed
    #[error("analysis request failed ({kind}): {message}")]
    Remote {
        kind: &'static str,
        message: String,
        /// Failed attempts so far, including this one
        retry_count: u32,
        /// Whether the UI should offer a retry
        can_retry: bool,
    },
}

/// A completed analysis with its provenance
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub analysis: AnalysisResult,
    /// Served from the local coarse-keyed cache
    pub cached: bool,
    /// Produced by the rule-based synthesizer after the remote path failed
    pub from_fallback: bool,
    /// Failed attempts on this client so far
    pub retry_count: u32,
}

/// Locally cached analysis with its own expiry
#[derive(Debug, Serialize, Deserialize)]
struct LocalEntry {
    analysis: AnalysisResult,
    expires_at: DateTime<Utc>,
}

/// Gateway response body; only the analysis itself matters client-side
#[derive(Debug, Deserialize)]
struct RemoteAnalysis {
    analysis: AnalysisResult,
}

/// Coarse cache key: assessment type plus a 5-year age bucket. Deliberately
/// much coarser than the server's pattern fingerprint.
fn coarse_key(input: &AnalysisInput) -> String {
    format!(
        "{}:age{}",
        input.assessment_type.as_str(),
        (input.demographics.age / 5) * 5
    )
}

/// Analysis client talking to one gateway
pub struct AnalysisClient {
    http: reqwest::Client,
    gateway_url: String,
    timeout: Duration,
    retry_limit: u32,
    cache_ttl: ChronoDuration,
    store: Arc<dyn CacheStore>,
    rate_limit: RateLimitPolicy,
    session: AnalysisSession,
    retry_count: AtomicU32,
}

impl AnalysisClient {
    /// Create a client backed by the in-memory store
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        Self::with_store(config, Arc::new(MemoryStore::new()))
    }

    /// Create a client over an externally supplied cache store
    pub fn with_store(
        config: ClientConfig,
        store: Arc<dyn CacheStore>,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.timeout_secs.min(5)))
            .build()
            .map_err(|e| ClientError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            gateway_url: config.gateway_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(config.timeout_secs),
            retry_limit: config.retry_limit,
            cache_ttl: ChronoDuration::seconds(config.cache_ttl_secs as i64),
            store,
            rate_limit: RateLimitPolicy::new(&config.rate_limit),
            session: AnalysisSession::new(config.dedupe_in_flight),
            retry_count: AtomicU32::new(0),
        })
    }

    /// Failed attempts so far
    pub fn retry_count(&self) -> u32 {
        self.retry_count.load(Ordering::SeqCst)
    }

    /// Whether the retry budget still has room
    pub fn can_retry(&self) -> bool {
        self.retry_count() < self.retry_limit
    }

    /// Current request state
    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    /// Analyze an assessment submission.
    ///
    /// Order of play: validate, admit through the session guard, serve from
    /// the coarse local cache, admit through the rate limiter, then call the
    /// gateway. A retryable failure inside the budget surfaces as
    /// [`ClientError::Remote`] with `can_retry: true`; anything else ends in
    /// the deterministic synthesizer, so the caller still gets an analysis.
    pub async fn analyze(&self, input: &AnalysisInput) -> Result<AnalysisReport, ClientError> {
        input
            .validate()
            .map_err(|failure| ClientError::Invalid(failure.to_string()))?;

        if !self.session.begin() {
            return Err(ClientError::InFlight);
        }

        let key = coarse_key(input);

        if let Some(analysis) = self.cached_analysis(&key).await {
            debug!(%key, "serving analysis from local cache");
            self.session.finish(SessionState::Done);
            return Ok(AnalysisReport {
                analysis,
                cached: true,
                from_fallback: false,
                retry_count: self.retry_count(),
            });
        }

        if let Err(failure) = self.rate_limit.check(&key) {
            self.session.finish(SessionState::Idle);
            let retry_after_secs = match failure {
                AnalysisFailure::RateLimited {
                    retry_after_secs, ..
                } => retry_after_secs,
                _ => 0,
            };
            return Err(ClientError::RateLimited { retry_after_secs });
        }

        match self.fetch_remote(input).await {
            Ok(analysis) => {
                self.retry_count.store(0, Ordering::SeqCst);
                self.cache_analysis(&key, &analysis).await;
                self.session.finish(SessionState::Done);
                Ok(AnalysisReport {
                    analysis,
                    cached: false,
                    from_fallback: false,
                    retry_count: 0,
                })
            }
            Err(failure) => {
                let retry_count = self.retry_count.fetch_add(1, Ordering::SeqCst) + 1;
                let can_retry = failure.retryable() && retry_count < self.retry_limit;

                if can_retry {
                    warn!(
                        kind = failure.kind(),
                        retry_count,
                        "analysis request failed, retry available"
                    );
                    self.session.finish(SessionState::Failed);
                    return Err(ClientError::Remote {
                        kind: failure.kind(),
                        message: failure.to_string(),
                        retry_count,
                        can_retry,
                    });
                }

                // Budget exhausted or the failure is not worth retrying: the
                // synthesizer still produces a complete analysis locally.
                warn!(
                    kind = failure.kind(),
                    retry_count,
                    "analysis request failed, synthesizing locally"
                );
                let analysis = fallback::synthesize(input);
                self.session.finish(SessionState::Done);
                Ok(AnalysisReport {
                    analysis,
                    cached: false,
                    from_fallback: true,
                    retry_count,
                })
            }
        }
    }

    async fn fetch_remote(
        &self,
        input: &AnalysisInput,
    ) -> Result<AnalysisResult, AnalysisFailure> {
        let url = format!("{}/v1/analysis", self.gateway_url);
        let request = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "input": input }))
            .send();

        let response = match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) if e.is_timeout() => {
                return Err(AnalysisFailure::Timeout {
                    seconds: self.timeout.as_secs(),
                });
            }
            Ok(Err(e)) => return Err(AnalysisFailure::Network(e.to_string())),
            Err(_elapsed) => {
                return Err(AnalysisFailure::Timeout {
                    seconds: self.timeout.as_secs(),
                });
            }
        };

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(AnalysisFailure::RateLimited {
                key: coarse_key(input),
                retry_after_secs: 0,
            });
        }
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            let message: String = message.chars().take(300).collect();
            return Err(AnalysisFailure::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: RemoteAnalysis = response
            .json()
            .await
            .map_err(|e| AnalysisFailure::ResponseParsing(e.to_string()))?;

        Ok(body.analysis)
    }

    async fn cached_analysis(&self, key: &str) -> Option<AnalysisResult> {
        let raw = self.store.get(key).await.ok()??;
        let entry: LocalEntry = serde_json::from_str(&raw).ok()?;
        if entry.expires_at <= Utc::now() {
            return None;
        }
        Some(entry.analysis)
    }

    /// Best-effort write; locally synthesized fallbacks are not cached
    /// since recomputing them is free.
    async fn cache_analysis(&self, key: &str, analysis: &AnalysisResult) {
        let entry = LocalEntry {
            analysis: analysis.clone(),
            expires_at: Utc::now() + self.cache_ttl,
        };
        match serde_json::to_string(&entry) {
            Ok(raw) => {
                if let Err(e) = self.store.put(key, &raw, entry.expires_at).await {
                    warn!(%key, error = %e, "failed to cache analysis locally");
                }
            }
            Err(e) => warn!(%key, error = %e, "failed to serialize local cache entry"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::test_support::sample_input;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> AnalysisClient {
        client_with(server, ClientConfig::default())
    }

    fn client_with(server: &MockServer, mut config: ClientConfig) -> AnalysisClient {
        config.gateway_url = server.uri();
        AnalysisClient::new(config).unwrap()
    }

    fn gateway_body() -> serde_json::Value {
        serde_json::json!({
            "analysis": fallback::synthesize(&sample_input()),
            "cached": false,
            "processing_time_ms": 5
        })
    }

    #[tokio::test]
    async fn test_remote_success_then_local_cache() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/analysis"))
            .respond_with(ResponseTemplate::new(200).set_body_json(gateway_body()))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let first = client.analyze(&sample_input()).await.unwrap();
        assert!(!first.cached);
        assert!(!first.from_fallback);
        assert_eq!(client.session_state(), SessionState::Done);

        // Second request is served locally; the mock's expect(1) verifies
        // no further network call happened.
        let second = client.analyze(&sample_input()).await.unwrap();
        assert!(second.cached);
        assert_eq!(second.analysis, first.analysis);
    }

    #[tokio::test]
    async fn test_coarse_key_collapses_nearby_ages() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/analysis"))
            .respond_with(ResponseTemplate::new(200).set_body_json(gateway_body()))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        client.analyze(&sample_input()).await.unwrap();

        // Age 44 shares the 40-44 bucket with age 42; metrics are ignored
        // by the coarse key entirely.
        let mut similar = sample_input();
        similar.demographics.age = 44;
        similar.health_metrics.sleep = 9;
        let report = client.analyze(&similar).await.unwrap();
        assert!(report.cached);
    }

    #[tokio::test]
    async fn test_retry_budget_is_enforced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/analysis"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let input = sample_input();

        for expected_count in 1..=2u32 {
            let err = client.analyze(&input).await.unwrap_err();
            match err {
                ClientError::Remote {
                    kind,
                    retry_count,
                    can_retry,
                    ..
                } => {
                    assert_eq!(kind, "API_ERROR");
                    assert_eq!(retry_count, expected_count);
                    assert!(can_retry);
                }
                other => panic!("unexpected error: {:?}", other),
            }
            assert_eq!(client.session_state(), SessionState::Failed);
        }

        // Third failure exhausts the budget: no more retry offers, the
        // synthesizer answers instead.
        let report = client.analyze(&input).await.unwrap();
        assert!(report.from_fallback);
        assert_eq!(report.retry_count, 3);
        assert!(!client.can_retry());
        assert_eq!(report.analysis.overall_score, 63);
        assert!(!report.analysis.disclaimer.is_empty());
    }

    #[tokio::test]
    async fn test_non_retryable_failure_falls_back_immediately() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/analysis"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let report = client.analyze(&sample_input()).await.unwrap();
        assert!(report.from_fallback);
        assert_eq!(report.retry_count, 1);
    }

    #[tokio::test]
    async fn test_timeout_surfaces_as_retryable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/analysis"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(gateway_body())
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let client = client_with(
            &server,
            ClientConfig {
                timeout_secs: 1,
                ..ClientConfig::default()
            },
        );
        let err = client.analyze(&sample_input()).await.unwrap_err();
        match err {
            ClientError::Remote {
                kind, can_retry, ..
            } => {
                assert_eq!(kind, "TIMEOUT");
                assert!(can_retry);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_retry_count_resets_after_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/analysis"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/analysis"))
            .respond_with(ResponseTemplate::new(200).set_body_json(gateway_body()))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let input = sample_input();

        assert!(client.analyze(&input).await.is_err());
        assert_eq!(client.retry_count(), 1);

        let report = client.analyze(&input).await.unwrap();
        assert!(!report.from_fallback);
        assert_eq!(client.retry_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_input_never_hits_the_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/analysis"))
            .respond_with(ResponseTemplate::new(200).set_body_json(gateway_body()))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let mut input = sample_input();
        input.demographics.age = 0;

        let err = client.analyze(&input).await.unwrap_err();
        assert!(matches!(err, ClientError::Invalid(_)));
    }

    #[tokio::test]
    async fn test_in_flight_requests_are_deduplicated() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/analysis"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(gateway_body())
                    .set_delay(Duration::from_millis(200)),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let input = sample_input();
        let (first, second) = tokio::join!(client.analyze(&input), client.analyze(&input));

        let in_flight_rejections = [&first, &second]
            .iter()
            .filter(|r| matches!(r, Err(ClientError::InFlight)))
            .count();
        assert_eq!(in_flight_rejections, 1);
        assert!(first.is_ok() || second.is_ok());
    }

    #[tokio::test]
    async fn test_local_rate_limit_rejects_before_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/analysis"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_with(
            &server,
            ClientConfig {
                rate_limit: RateLimitConfig {
                    enabled: true,
                    max_requests: 1,
                    window_secs: 60,
                },
                ..ClientConfig::default()
            },
        );

        // First attempt consumes the window (and fails remotely)
        assert!(client.analyze(&sample_input()).await.is_err());

        let err = client.analyze(&sample_input()).await.unwrap_err();
        assert!(matches!(err, ClientError::RateLimited { .. }));
    }
}
