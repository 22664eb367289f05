//! LLM chat-completion client
//!
//! Thin reqwest wrapper around an OpenAI-compatible chat-completions API.
//! Every call runs under a hard `tokio::time::timeout` deadline; dropping
//! the future aborts the in-flight request, which surfaces as a retryable
//! `TIMEOUT` failure.

use crate::config::LlmConfig;
use crate::utils::error::{AnalysisFailure, GatewayError, Result};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

/// Chat-completion client bound to one provider configuration
#[derive(Debug, Clone)]
pub struct LlmClient {
    http: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    timeout: Duration,
}

impl LlmClient {
    /// Build a client from configuration. Returns `None` when no API key is
    /// configured - an expected state that routes callers to the fallback.
    pub fn from_config(config: &LlmConfig) -> Result<Option<Self>> {
        let Some(api_key) = config.api_key.clone() else {
            return Ok(None);
        };

        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.timeout_secs.min(5)))
            .build()
            .map_err(|e| GatewayError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Some(Self {
            http,
            api_key,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout: Duration::from_secs(config.timeout_secs),
        }))
    }

    /// Execute one chat completion and return the assistant's raw text
    pub async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> std::result::Result<String, AnalysisFailure> {
        let url = format!("{}/chat/completions", self.api_base);
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_prompt },
            ],
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
        });

        debug!(model = %self.model, "dispatching LLM request");

        let request = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
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

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| AnalysisFailure::ResponseParsing(e.to_string()))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| {
                AnalysisFailure::ResponseParsing("completion contained no choices".to_string())
            })
    }
}
