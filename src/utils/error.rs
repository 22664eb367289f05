//! Error handling for the Gateway
//!
//! Two layers: `AnalysisFailure` classifies failures of the analysis
//! pipeline (LLM call, parsing, policy checks) and is always absorbed by the
//! generator's fallback path. `GatewayError` is the outer error type that can
//! surface to HTTP callers.

use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

/// Result type alias for the Gateway
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Failure kinds of the analysis pipeline.
///
/// These never escape `AnalysisGenerator::generate` — they are logged and
/// converted into a rule-based result. The SDK surfaces them to its caller
/// together with the retry budget.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisFailure {
    /// The LLM call exceeded its deadline
    #[error("LLM request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// The LLM API answered with a non-success status
    #[error("LLM API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// A rate-limit policy rejected the request
    #[error("rate limit exceeded for key '{key}', window resets in {retry_after_secs}s")]
    RateLimited { key: String, retry_after_secs: u64 },

    /// The submitted assessment failed validation
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Transport-level failure talking to the LLM or the gateway
    #[error("network error: {0}")]
    Network(String),

    /// The LLM answered but its payload was not a valid analysis
    #[error("failed to parse LLM response: {0}")]
    ResponseParsing(String),

    /// No API key configured; an expected condition, not an outage
    #[error("no LLM credentials configured")]
    MissingCredentials,
}

impl AnalysisFailure {
    /// Stable machine-readable kind, used in logs and SDK error surfaces
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "TIMEOUT",
            Self::Api { .. } => "API_ERROR",
            Self::RateLimited { .. } => "RATE_LIMIT",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Network(_) => "NETWORK_ERROR",
            Self::ResponseParsing(_) => "PARSE_ERROR",
            Self::MissingCredentials => "MISSING_CREDENTIALS",
        }
    }

    /// Whether a caller may reasonably retry the same request
    pub fn retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::Api { .. } | Self::Network(_)
        )
    }
}

/// Main error type for the Gateway
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP client errors
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Cache store errors (downgraded to misses by the cache layer)
    #[error("Cache error: {0}")]
    Cache(String),

    /// Rate limiting errors
    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Bad request errors
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Timeout errors
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// Internal server errors
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ResponseError for GatewayError {
    fn error_response(&self) -> HttpResponse {
        let (status_code, error_code, message) = match self {
            GatewayError::Config(_) => (
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                "CONFIG_ERROR",
                self.to_string(),
            ),
            GatewayError::Cache(_) => (
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                "CACHE_ERROR",
                "Cache operation failed".to_string(),
            ),
            GatewayError::RateLimit(_) => (
                actix_web::http::StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMIT_EXCEEDED",
                self.to_string(),
            ),
            GatewayError::Validation(_) => (
                actix_web::http::StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                self.to_string(),
            ),
            GatewayError::BadRequest(_) => (
                actix_web::http::StatusCode::BAD_REQUEST,
                "BAD_REQUEST",
                self.to_string(),
            ),
            GatewayError::NotFound(_) => (
                actix_web::http::StatusCode::NOT_FOUND,
                "NOT_FOUND",
                self.to_string(),
            ),
            GatewayError::Timeout(_) => (
                actix_web::http::StatusCode::GATEWAY_TIMEOUT,
                "TIMEOUT",
                self.to_string(),
            ),
            _ => (
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            ),
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: error_code.to_string(),
                message,
                timestamp: chrono::Utc::now().timestamp(),
            },
        };

        HttpResponse::build(status_code).json(error_response)
    }
}

/// Standard error response format
#[derive(serde::Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Error detail structure
#[derive(serde::Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    pub timestamp: i64,
}

/// Helper constructors for common cases
impl GatewayError {
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache(message.into())
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    pub fn bad_request<S: Into<String>>(message: S) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    pub fn server<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }
}

impl From<AnalysisFailure> for GatewayError {
    fn from(err: AnalysisFailure) -> Self {
        match err {
            AnalysisFailure::Timeout { .. } => GatewayError::Timeout(err.to_string()),
            AnalysisFailure::RateLimited { .. } => GatewayError::RateLimit(err.to_string()),
            AnalysisFailure::InvalidInput(msg) => GatewayError::Validation(msg),
            AnalysisFailure::Api { .. }
            | AnalysisFailure::Network(_)
            | AnalysisFailure::ResponseParsing(_)
            | AnalysisFailure::MissingCredentials => GatewayError::Internal(err.to_string()),
        }
    }
}
