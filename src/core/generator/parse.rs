//! LLM response parsing and validation
//!
//! The LLM's text output is an untrusted payload. It is fence-stripped,
//! parsed, checked for the required top-level fields, and range-clamped
//! before it may become an [`AnalysisResult`]. Any violation is a parse
//! failure that routes the caller to the rule-based fallback - no partial
//! repair is attempted.

use crate::core::result::{
    AnalysisResult, AreaAnalysis, AreaInsight, DISCLAIMER, Grade, RiskLevel,
};
use crate::utils::error::AnalysisFailure;
use crate::utils::generate_analysis_id;
use serde::Deserialize;

const REQUIRED_FIELDS: [&str; 4] = [
    "overall_grade",
    "overall_score",
    "area_analysis",
    "priority_actions",
];

/// Permissive mirror of the response shape; ranges are clamped on conversion
#[derive(Debug, Deserialize)]
struct LlmAnalysis {
    overall_grade: Grade,
    overall_score: f64,
    area_analysis: LlmAreaAnalysis,
    priority_actions: Vec<String>,
    #[serde(default)]
    risk_factors: Vec<String>,
    #[serde(default)]
    positive_aspects: Vec<String>,
    #[serde(default)]
    personalized_message: String,
    #[serde(default)]
    improvement_potential: String,
    #[serde(default)]
    key_insights: Vec<String>,
    #[serde(default)]
    disclaimer: String,
}

#[derive(Debug, Deserialize)]
struct LlmAreaAnalysis {
    hydration: LlmAreaInsight,
    sleep: LlmAreaInsight,
    exercise: LlmAreaInsight,
    nutrition: LlmAreaInsight,
}

#[derive(Debug, Deserialize)]
struct LlmAreaInsight {
    score: f64,
    grade: Option<Grade>,
    #[serde(default)]
    insights: String,
    #[serde(default)]
    recommendations: Vec<String>,
    risk_level: Option<RiskLevel>,
    #[serde(default)]
    improvement_tips: Vec<String>,
}

impl LlmAreaInsight {
    fn into_insight(self) -> AreaInsight {
        let score = self.score.clamp(0.0, 10.0).round() as u8;
        AreaInsight {
            score,
            grade: self
                .grade
                .unwrap_or_else(|| Grade::from_score(score as f64 * 10.0)),
            insights: self.insights,
            recommendations: self.recommendations,
            risk_level: self.risk_level.unwrap_or(match score {
                0..=3 => RiskLevel::High,
                4..=6 => RiskLevel::Medium,
                _ => RiskLevel::Low,
            }),
            improvement_tips: self.improvement_tips,
        }
    }
}

/// Parse and validate the raw LLM text into an [`AnalysisResult`].
///
/// Identity stamps (`generated_at`, `analysis_id`, `processing_time_ms`,
/// `model`) are placeholders here; the generator overwrites them for every
/// result it returns.
pub fn parse_analysis_text(raw: &str) -> Result<AnalysisResult, AnalysisFailure> {
    let stripped = strip_code_fences(raw);

    let value: serde_json::Value = serde_json::from_str(stripped)
        .map_err(|e| AnalysisFailure::ResponseParsing(format!("invalid JSON: {}", e)))?;

    for field in REQUIRED_FIELDS {
        if value.get(field).is_none() {
            return Err(AnalysisFailure::ResponseParsing(format!(
                "missing required field '{}'",
                field
            )));
        }
    }

    let parsed: LlmAnalysis = serde_json::from_value(value)
        .map_err(|e| AnalysisFailure::ResponseParsing(format!("schema mismatch: {}", e)))?;

    let overall_score = parsed.overall_score.clamp(0.0, 100.0).round() as u8;

    let mut priority_actions = parsed.priority_actions;
    priority_actions.truncate(3);

    let disclaimer = if parsed.disclaimer.trim().is_empty() {
        DISCLAIMER.to_string()
    } else {
        parsed.disclaimer
    };

    Ok(AnalysisResult {
        overall_grade: parsed.overall_grade,
        overall_score,
        area_analysis: AreaAnalysis {
            hydration: parsed.area_analysis.hydration.into_insight(),
            sleep: parsed.area_analysis.sleep.into_insight(),
            exercise: parsed.area_analysis.exercise.into_insight(),
            nutrition: parsed.area_analysis.nutrition.into_insight(),
        },
        priority_actions,
        risk_factors: parsed.risk_factors,
        positive_aspects: parsed.positive_aspects,
        personalized_message: parsed.personalized_message,
        improvement_potential: parsed.improvement_potential,
        key_insights: parsed.key_insights,
        disclaimer,
        generated_at: chrono::Utc::now(),
        analysis_id: generate_analysis_id(),
        processing_time_ms: 0,
        model: String::new(),
    })
}

/// Strip a surrounding markdown code fence (```json ... ```), if present
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. "json") up to the first newline
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area(score: u8) -> String {
        format!(
            r#"{{ "score": {}, "grade": "B", "insights": "ok", "recommendations": [], "risk_level": "low", "improvement_tips": [] }}"#,
            score
        )
    }

    fn payload(overall_score: &str) -> String {
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
            a = area(7)
        )
    }

    #[test]
    fn test_parses_plain_json() {
        let result = parse_analysis_text(&payload("82")).unwrap();
        assert_eq!(result.overall_score, 82);
        assert_eq!(result.overall_grade, Grade::BPlus);
        assert_eq!(result.priority_actions.len(), 3);
    }

    #[test]
    fn test_strips_markdown_fences() {
        let fenced = format!("```json\n{}\n```", payload("82"));
        let result = parse_analysis_text(&fenced).unwrap();
        assert_eq!(result.overall_score, 82);

        let bare_fence = format!("```\n{}\n```", payload("70"));
        assert_eq!(parse_analysis_text(&bare_fence).unwrap().overall_score, 70);
    }

    #[test]
    fn test_out_of_range_score_is_clamped() {
        assert_eq!(parse_analysis_text(&payload("150")).unwrap().overall_score, 100);
        assert_eq!(parse_analysis_text(&payload("-20")).unwrap().overall_score, 0);
    }

    #[test]
    fn test_missing_required_field_is_rejected() {
        let without_actions = payload("82").replace("priority_actions", "actions");
        let err = parse_analysis_text(&without_actions).unwrap_err();
        assert_eq!(err.kind(), "PARSE_ERROR");
        assert!(err.to_string().contains("priority_actions"));
    }

    #[test]
    fn test_non_json_is_rejected() {
        let err = parse_analysis_text("I'm sorry, I can't do that").unwrap_err();
        assert_eq!(err.kind(), "PARSE_ERROR");
    }

    #[test]
    fn test_blank_disclaimer_is_replaced() {
        let result = parse_analysis_text(&payload("82")).unwrap();
        assert_eq!(result.disclaimer, DISCLAIMER);
    }

    #[test]
    fn test_surplus_actions_are_truncated() {
        let extra = payload("82").replace(
            r#"["one", "two", "three"]"#,
            r#"["one", "two", "three", "four", "five"]"#,
        );
        let result = parse_analysis_text(&extra).unwrap();
        assert_eq!(result.priority_actions.len(), 3);
    }

    #[test]
    fn test_area_score_clamped_and_grade_defaulted() {
        let loose = payload("82").replace(
            &area(7),
            r#"{ "score": 14, "insights": "ok" }"#,
        );
        let result = parse_analysis_text(&loose).unwrap();
        assert_eq!(result.area_analysis.hydration.score, 10);
        assert_eq!(result.area_analysis.hydration.grade, Grade::APlus);
        assert_eq!(result.area_analysis.hydration.risk_level, RiskLevel::Low);
    }
}
