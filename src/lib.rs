//! # Wellscore
//!
//! Assessment analysis gateway: normalizes health/wealth assessment
//! submissions into coarse pattern keys, serves cached analyses per
//! pattern, and generates fresh analyses through an LLM with a
//! deterministic rule-based fallback.
//!
//! ## Features
//!
//! - **Pattern caching**: many similar users share one cached analysis
//!   (age decade, BMI category, gender, bucketed scores)
//! - **Guaranteed results**: every LLM failure mode - missing credentials,
//!   timeout, API error, malformed payload - is absorbed by a pure
//!   rule-based synthesizer, so callers always receive a valid analysis
//! - **Shared core**: the HTTP server and the client SDK consume one
//!   implementation of the normalizer, the cache, and the synthesizer
//! - **Configurable policies**: rate limiting and in-flight deduplication
//!   are explicit, default-enabled configuration
//!
//! ## Quick Start - Client SDK
//!
//! ```rust,no_run
//! use wellscore::core::types::{
//!     AnalysisInput, AssessmentType, Demographics, Gender, HealthMetrics,
//! };
//! use wellscore::sdk::{AnalysisClient, ClientConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = AnalysisClient::new(ClientConfig::default())?;
//!
//!     let input = AnalysisInput {
//!         assessment_type: AssessmentType::Health,
//!         demographics: Demographics {
//!             age: 42,
//!             weight_kg: 82.0,
//!             height_cm: 178.0,
//!             gender: Gender::Male,
//!         },
//!         health_metrics: HealthMetrics {
//!             hydration: 6,
//!             sleep: 4,
//!             exercise: 8,
//!             nutrition: 7,
//!         },
//!         answers: vec![],
//!         session_id: None,
//!     };
//!
//!     let report = client.analyze(&input).await?;
//!     println!(
//!         "score {} ({})",
//!         report.analysis.overall_score,
//!         report.analysis.overall_grade.as_str()
//!     );
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Gateway Mode
//!
//! ```rust,no_run
//! use wellscore::{Config, Gateway};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_file("config/gateway.yaml").await?;
//!     let gateway = Gateway::new(config).await?;
//!     gateway.run().await?;
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod config;
pub mod core;
pub mod sdk;
pub mod server;
pub mod storage;
pub mod utils;

// Re-export main types
pub use config::Config;
pub use core::cache::AnalysisCache;
pub use core::generator::AnalysisGenerator;
pub use core::pattern::PatternKey;
pub use core::result::{AnalysisResult, Grade};
pub use core::types::AnalysisInput;
pub use utils::error::{AnalysisFailure, GatewayError, Result};

use tracing::info;

/// A minimal gateway facade over the HTTP server
pub struct Gateway {
    config: Config,
    server: server::HttpServer,
}

impl Gateway {
    /// Create a new gateway instance
    pub async fn new(config: Config) -> Result<Self> {
        info!("Creating new gateway instance");

        let server = server::HttpServer::new(&config).await?;

        Ok(Self { config, server })
    }

    /// Run the gateway server
    pub async fn run(self) -> Result<()> {
        info!("Starting Wellscore Gateway");
        info!("Configuration: {:#?}", self.config);

        self.server.start().await?;

        Ok(())
    }
}

// Version information
/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Name of the crate
pub const NAME: &str = env!("CARGO_PKG_NAME");
/// Description of the crate
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(VERSION, env!("CARGO_PKG_VERSION"));
        assert_eq!(NAME, "wellscore");
        assert!(!DESCRIPTION.is_empty());
    }
}
