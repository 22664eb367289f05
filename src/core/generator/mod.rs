//! Analysis generation
//!
//! Orchestrates the LLM path and the rule-based fallback. `generate` is
//! infallible at this boundary: every failure of the LLM layer (missing
//! credentials, timeout, API error, malformed payload) is logged with its
//! kind and absorbed into a synthesized result, so callers always receive a
//! well-formed analysis.

mod llm;
mod parse;
mod prompt;

pub use llm::LlmClient;
pub use parse::parse_analysis_text;
pub use prompt::{SYSTEM_PROMPT, build_analysis_prompt};

use crate::config::LlmConfig;
use crate::core::fallback;
use crate::core::result::AnalysisResult;
use crate::core::types::AnalysisInput;
use crate::utils::error::{AnalysisFailure, Result};
use crate::utils::generate_analysis_id;
use tracing::{debug, info, warn};

/// Analysis generator bound to one LLM configuration
pub struct AnalysisGenerator {
    client: Option<LlmClient>,
    model: String,
    max_prompt_answers: usize,
}

impl AnalysisGenerator {
    /// Build a generator from configuration.
    ///
    /// A missing API key is an expected state: the generator is still fully
    /// functional and serves every request from the rule-based synthesizer.
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let client = LlmClient::from_config(config)?;
        if client.is_none() {
            info!("no LLM credentials configured, analyses will use the rule-based synthesizer");
        }

        Ok(Self {
            client,
            model: config.model.clone(),
            max_prompt_answers: config.max_prompt_answers,
        })
    }

    /// Whether an LLM client is configured
    pub fn llm_enabled(&self) -> bool {
        self.client.is_some()
    }

    /// Produce an analysis for this input. Never fails.
    ///
    /// Every result, LLM-generated or synthesized, leaves here with a fresh
    /// `generated_at`, `analysis_id`, and measured `processing_time_ms`.
    pub async fn generate(&self, input: &AnalysisInput) -> AnalysisResult {
        let started = std::time::Instant::now();

        let mut result = match self.generate_via_llm(input).await {
            Ok(result) => result,
            Err(AnalysisFailure::MissingCredentials) => {
                debug!("no LLM credentials, synthesizing analysis");
                fallback::synthesize(input)
            }
            Err(failure) => {
                warn!(
                    kind = failure.kind(),
                    error = %failure,
                    "LLM analysis failed, using rule-based fallback"
                );
                fallback::synthesize(input)
            }
        };

        result.generated_at = chrono::Utc::now();
        result.analysis_id = generate_analysis_id();
        result.processing_time_ms = started.elapsed().as_millis() as u64;
        result
    }

    async fn generate_via_llm(
        &self,
        input: &AnalysisInput,
    ) -> std::result::Result<AnalysisResult, AnalysisFailure> {
        let Some(client) = &self.client else {
            return Err(AnalysisFailure::MissingCredentials);
        };

        let user_prompt = build_analysis_prompt(input, self.max_prompt_answers);
        let raw = client.complete(SYSTEM_PROMPT, &user_prompt).await?;

        let mut result = parse_analysis_text(&raw)?;
        result.model = self.model.clone();
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fallback::FALLBACK_MODEL;
    use crate::core::result::Grade;
    use crate::core::types::test_support::sample_input;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn generator_for(server: &MockServer) -> AnalysisGenerator {
        let config = LlmConfig {
            api_key: Some("test-key".to_string()),
            api_base: server.uri(),
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 2,
            ..LlmConfig::default()
        };
        AnalysisGenerator::from_config(&config).unwrap()
    }

    fn analysis_json(overall_score: &str) -> String {
        let area = r#"{ "score": 7, "grade": "B", "insights": "ok", "recommendations": [],
            "risk_level": "low", "improvement_tips": [] }"#;
        format!(
            r#"{{
                "overall_grade": "B+",
                "overall_score": {},
                "area_analysis": {{
                    "hydration": {a}, "sleep": {a}, "exercise": {a}, "nutrition": {a}
                }},
                "priority_actions": ["one", "two", "three"]
            }}"#,
            overall_score,
            a = area
        )
    }

    fn completion_body(content: &str) -> serde_json::Value {
        serde_json::json!({
            "choices": [ { "message": { "role": "assistant", "content": content } } ]
        })
    }

    #[tokio::test]
    async fn test_missing_credentials_route_to_fallback() {
        let generator = AnalysisGenerator::from_config(&LlmConfig::default()).unwrap();
        assert!(!generator.llm_enabled());

        let result = generator.generate(&sample_input()).await;
        assert_eq!(result.model, FALLBACK_MODEL);
        assert_eq!(result.overall_score, 63);
        assert_eq!(result.overall_grade, Grade::CPlus);
        assert!(!result.disclaimer.is_empty());
    }

    #[tokio::test]
    async fn test_successful_llm_response_is_stamped() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(completion_body(&analysis_json("82"))),
            )
            .mount(&server)
            .await;

        let generator = generator_for(&server);
        let result = generator.generate(&sample_input()).await;
        assert_eq!(result.model, "gpt-4o-mini");
        assert_eq!(result.overall_score, 82);
        assert!(result.analysis_id.starts_with("analysis_"));
        assert!(!result.disclaimer.is_empty());
    }

    #[tokio::test]
    async fn test_out_of_range_llm_score_is_clamped() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(completion_body(&analysis_json("150"))),
            )
            .mount(&server)
            .await;

        let generator = generator_for(&server);
        let result = generator.generate(&sample_input()).await;
        assert_eq!(result.overall_score, 100);
    }

    #[tokio::test]
    async fn test_garbage_llm_response_falls_back() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion_body("I am unable to produce JSON today")),
            )
            .mount(&server)
            .await;

        let generator = generator_for(&server);
        let result = generator.generate(&sample_input()).await;
        // The deterministic synthesizer answers instead
        assert_eq!(result.model, FALLBACK_MODEL);
        assert_eq!(result.overall_score, 63);
        assert!(!result.disclaimer.is_empty());
    }

    #[tokio::test]
    async fn test_api_error_falls_back() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let generator = generator_for(&server);
        let result = generator.generate(&sample_input()).await;
        assert_eq!(result.model, FALLBACK_MODEL);
        assert_eq!(result.priority_actions.len(), 3);
    }

    #[tokio::test]
    async fn test_fenced_llm_response_is_accepted() {
        let server = MockServer::start().await;
        let fenced = format!("```json\n{}\n```", analysis_json("76"));
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(&fenced)))
            .mount(&server)
            .await;

        let generator = generator_for(&server);
        let result = generator.generate(&sample_input()).await;
        assert_eq!(result.overall_score, 76);
        assert_eq!(result.model, "gpt-4o-mini");
    }
}
