//! Assessment submission types
//!
//! An [`AnalysisInput`] is the raw material of the pipeline: demographics,
//! four 0-10 health-area scores, and the free-form questionnaire answers.
//! It is immutable once constructed and only ever used to derive a pattern
//! key and to build the LLM prompt.

use crate::utils::error::AnalysisFailure;
use serde::{Deserialize, Serialize};

/// Kind of assessment the user completed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssessmentType {
    Health,
    Wealth,
    Hybrid,
}

impl AssessmentType {
    /// Stable lowercase name, used in cache keys and log fields
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Health => "health",
            Self::Wealth => "wealth",
            Self::Hybrid => "hybrid",
        }
    }
}

/// Self-reported gender bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Other => "other",
        }
    }
}

/// User demographics captured by the assessment form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Demographics {
    /// Age in whole years
    pub age: u32,
    /// Body weight in kilograms
    pub weight_kg: f64,
    /// Height in centimetres
    pub height_cm: f64,
    /// Gender bucket
    pub gender: Gender,
}

impl Demographics {
    /// Body mass index from weight and height
    pub fn bmi(&self) -> f64 {
        let height_m = self.height_cm / 100.0;
        self.weight_kg / (height_m * height_m)
    }
}

/// The four 0-10 health-area scores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthMetrics {
    pub hydration: u8,
    pub sleep: u8,
    pub exercise: u8,
    pub nutrition: u8,
}

impl HealthMetrics {
    /// Scores in the canonical area order (hydration, sleep, exercise, nutrition)
    pub fn as_array(&self) -> [u8; 4] {
        [self.hydration, self.sleep, self.exercise, self.nutrition]
    }

    /// Mean of the four scores
    pub fn average(&self) -> f64 {
        self.as_array().iter().map(|&s| s as f64).sum::<f64>() / 4.0
    }
}

/// A single free-form questionnaire answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: String,
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// A complete assessment submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisInput {
    pub assessment_type: AssessmentType,
    pub demographics: Demographics,
    pub health_metrics: HealthMetrics,
    #[serde(default)]
    pub answers: Vec<Answer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl AnalysisInput {
    /// Validate documented numeric ranges before the input enters the pipeline.
    ///
    /// Range violations are `INVALID_INPUT` (not retryable) and are rejected
    /// before normalization or any cache access.
    pub fn validate(&self) -> Result<(), AnalysisFailure> {
        let d = &self.demographics;
        if d.age == 0 || d.age > 130 {
            return Err(AnalysisFailure::InvalidInput(format!(
                "age must be between 1 and 130, got {}",
                d.age
            )));
        }
        if !(d.weight_kg.is_finite() && d.weight_kg > 0.0) {
            return Err(AnalysisFailure::InvalidInput(format!(
                "weight_kg must be a positive number, got {}",
                d.weight_kg
            )));
        }
        if !(d.height_cm.is_finite() && d.height_cm > 0.0) {
            return Err(AnalysisFailure::InvalidInput(format!(
                "height_cm must be a positive number, got {}",
                d.height_cm
            )));
        }
        for (area, score) in [
            ("hydration", self.health_metrics.hydration),
            ("sleep", self.health_metrics.sleep),
            ("exercise", self.health_metrics.exercise),
            ("nutrition", self.health_metrics.nutrition),
        ] {
            if score > 10 {
                return Err(AnalysisFailure::InvalidInput(format!(
                    "{} score must be between 0 and 10, got {}",
                    area, score
                )));
            }
        }
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::sample_input;
    use super::*;

    #[test]
    fn test_bmi_computation() {
        let input = sample_input();
        let bmi = input.demographics.bmi();
        assert!((bmi - 25.88).abs() < 0.01, "bmi was {}", bmi);
    }

    #[test]
    fn test_metric_average() {
        let input = sample_input();
        assert_eq!(input.health_metrics.average(), 6.25);
    }

    #[test]
    fn test_validation_accepts_documented_ranges() {
        assert!(sample_input().validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_out_of_range_metric() {
        let mut input = sample_input();
        input.health_metrics.sleep = 11;
        let err = input.validate().unwrap_err();
        assert_eq!(err.kind(), "INVALID_INPUT");
        assert!(!err.retryable());
    }

    #[test]
    fn test_validation_rejects_zero_height() {
        let mut input = sample_input();
        input.demographics.height_cm = 0.0;
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_assessment_type_wire_format() {
        let json = serde_json::to_string(&AssessmentType::Health).unwrap();
        assert_eq!(json, "\"health\"");
        let back: AssessmentType = serde_json::from_str("\"hybrid\"").unwrap();
        assert_eq!(back, AssessmentType::Hybrid);
    }
}
