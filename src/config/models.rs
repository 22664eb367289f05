//! Configuration sections
//!
//! Each section carries serde defaults so a partial YAML file (or none at
//! all) still yields a runnable configuration.

use serde::{Deserialize, Serialize};

/// Top-level gateway configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// LLM provider settings
    #[serde(default)]
    pub llm: LlmConfig,
    /// Analysis cache settings
    #[serde(default)]
    pub cache: CacheConfig,
    /// Request policies
    #[serde(default)]
    pub policy: PolicyConfig,
}

impl GatewayConfig {
    /// Apply environment overrides on top of whatever was loaded.
    ///
    /// Only a handful of operational knobs are overridable; everything else
    /// belongs in the config file.
    pub fn apply_env(&mut self) {
        if let Ok(host) = std::env::var("WELLSCORE_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("WELLSCORE_PORT") {
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }
        if let Ok(key) = std::env::var("WELLSCORE_LLM_API_KEY") {
            if !key.is_empty() {
                self.llm.api_key = Some(key);
            }
        }
        if let Ok(base) = std::env::var("WELLSCORE_LLM_API_BASE") {
            self.llm.api_base = base;
        }
        if let Ok(model) = std::env::var("WELLSCORE_LLM_MODEL") {
            self.llm.model = model;
        }
        if let Ok(ttl) = std::env::var("WELLSCORE_CACHE_TTL_SECS") {
            if let Ok(ttl) = ttl.parse() {
                self.cache.ttl_secs = ttl;
            }
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Number of worker threads (defaults to the actix default)
    pub workers: Option<usize>,
    /// CORS configuration
    #[serde(default)]
    pub cors: CorsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
            cors: CorsConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Get the server bind address
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Validate server configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("Port cannot be 0".to_string());
        }
        if self.host.is_empty() {
            return Err("Host cannot be empty".to_string());
        }
        Ok(())
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Allowed origins; empty means any origin
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_origins: Vec::new(),
        }
    }
}

impl CorsConfig {
    pub fn allows_all_origins(&self) -> bool {
        self.allowed_origins.is_empty()
            || self.allowed_origins.iter().any(|o| o == "*")
    }
}

/// LLM provider configuration
///
/// A missing `api_key` is an expected state: the generator then routes every
/// request straight to the rule-based synthesizer without a network attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API key; typically supplied via WELLSCORE_LLM_API_KEY
    #[serde(default)]
    pub api_key: Option<String>,
    /// Base URL of the OpenAI-compatible chat-completions API
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,
    /// Token budget for one analysis
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Hard deadline for the whole LLM call
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
    /// Cap on raw answers embedded into the prompt
    #[serde(default = "default_max_prompt_answers")]
    pub max_prompt_answers: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: default_api_base(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_llm_timeout(),
            max_prompt_answers: default_max_prompt_answers(),
        }
    }
}

impl LlmConfig {
    /// Validate LLM configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.timeout_secs == 0 {
            return Err("LLM timeout cannot be 0".to_string());
        }
        if self.max_tokens == 0 {
            return Err("LLM max_tokens cannot be 0".to_string());
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(format!(
                "LLM temperature must be within 0.0-2.0, got {}",
                self.temperature
            ));
        }
        if self.api_base.is_empty() {
            return Err("LLM api_base cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Analysis cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Time-to-live for cached analyses
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: default_cache_ttl(),
        }
    }
}

impl CacheConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.enabled && self.ttl_secs == 0 {
            return Err("Cache TTL cannot be 0 when the cache is enabled".to_string());
        }
        Ok(())
    }
}

/// Request policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Per-pattern rate limiting
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Reject a second identical request while the first is still in flight
    /// (SDK side)
    #[serde(default = "default_true")]
    pub dedupe_in_flight: bool,
    /// SDK retry budget
    #[serde(default = "default_retry_limit")]
    pub client_retry_limit: u32,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            rate_limit: RateLimitConfig::default(),
            dedupe_in_flight: true,
            client_retry_limit: default_retry_limit(),
        }
    }
}

/// Rate-limit policy: a count and a reset window per key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_rate_limit_max")]
    pub max_requests: u32,
    #[serde(default = "default_rate_limit_window")]
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: default_rate_limit_max(),
            window_secs: default_rate_limit_window(),
        }
    }
}

impl RateLimitConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.enabled {
            if self.max_requests == 0 {
                return Err("Rate limit max_requests cannot be 0".to_string());
            }
            if self.window_secs == 0 {
                return Err("Rate limit window cannot be 0".to_string());
            }
        }
        Ok(())
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_true() -> bool {
    true
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_temperature() -> f32 {
    0.4
}

fn default_llm_timeout() -> u64 {
    10
}

fn default_max_prompt_answers() -> usize {
    10
}

fn default_cache_ttl() -> u64 {
    3600
}

fn default_retry_limit() -> u32 {
    3
}

fn default_rate_limit_max() -> u32 {
    10
}

fn default_rate_limit_window() -> u64 {
    60
}
