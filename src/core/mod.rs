//! Core analysis pipeline
//!
//! The pipeline is implemented once here and consumed by both the HTTP
//! server and the SDK mirror: pattern normalization, the pattern-keyed
//! cache, the LLM-backed generator, and the rule-based fallback.

pub mod cache;
pub mod fallback;
pub mod generator;
pub mod pattern;
pub mod policy;
pub mod result;
pub mod types;

pub use cache::{AnalysisCache, CacheEntry, CacheHit, CacheStats};
pub use generator::AnalysisGenerator;
pub use pattern::{BmiCategory, PatternKey};
pub use policy::RateLimitPolicy;
pub use result::{AnalysisResult, AreaAnalysis, AreaInsight, Grade, HealthArea, RiskLevel};
pub use types::{AnalysisInput, AssessmentType, Demographics, Gender, HealthMetrics};
