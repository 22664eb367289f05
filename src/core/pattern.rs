//! Pattern normalization
//!
//! Collapses an [`AnalysisInput`] into a coarse [`PatternKey`] so that many
//! distinct users share one cached analysis: age by decade, BMI by category,
//! metric scores bucketed to even values. This precision/cost tradeoff is
//! deliberate - inputs that agree on the key receive the same cached result
//! within the cache validity window.

use crate::core::types::{AnalysisInput, AssessmentType, Gender};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// BMI category with the standard 18.5 / 25 / 30 thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    /// Bucket a BMI value
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            Self::Underweight
        } else if bmi < 25.0 {
            Self::Normal
        } else if bmi < 30.0 {
            Self::Overweight
        } else {
            Self::Obese
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Underweight => "underweight",
            Self::Normal => "normal",
            Self::Overweight => "overweight",
            Self::Obese => "obese",
        }
    }
}

/// Coarse-grained summary of a submission, used as the cache identity.
///
/// Field order is part of the wire contract: the fingerprint hashes the
/// canonical JSON serialization of this struct, so reordering fields would
/// silently invalidate every cached row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PatternKey {
    pub assessment_type: AssessmentType,
    /// Age rounded down to the decade (42 -> 40)
    pub age_decade: u32,
    pub bmi_category: BmiCategory,
    pub gender_bucket: Gender,
    /// Metric scores bucketed to even values, canonical area order
    pub metric_buckets: [u8; 4],
}

/// Bucket a 0-10 score to an even value; odd scores round down (7 -> 6)
fn bucket_metric(score: u8) -> u8 {
    (score.min(10) / 2) * 2
}

impl PatternKey {
    /// Normalize an input into its pattern key. Pure and total over the
    /// validated input ranges.
    pub fn from_input(input: &AnalysisInput) -> Self {
        let metrics = input.health_metrics.as_array();
        Self {
            assessment_type: input.assessment_type,
            age_decade: (input.demographics.age / 10) * 10,
            bmi_category: BmiCategory::from_bmi(input.demographics.bmi()),
            gender_bucket: input.demographics.gender,
            metric_buckets: [
                bucket_metric(metrics[0]),
                bucket_metric(metrics[1]),
                bucket_metric(metrics[2]),
                bucket_metric(metrics[3]),
            ],
        }
    }

    /// Hex SHA-256 digest of the canonical serialization, used as the cache
    /// row key. serde_json emits struct fields in declaration order, which
    /// keeps the serialization stable across runs.
    pub fn fingerprint(&self) -> String {
        let canonical =
            serde_json::to_vec(self).expect("pattern key serialization cannot fail");
        let digest = Sha256::digest(&canonical);
        hex::encode(digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::test_support::sample_input;

    #[test]
    fn test_bmi_category_thresholds() {
        assert_eq!(BmiCategory::from_bmi(18.4), BmiCategory::Underweight);
        assert_eq!(BmiCategory::from_bmi(18.5), BmiCategory::Normal);
        assert_eq!(BmiCategory::from_bmi(24.9), BmiCategory::Normal);
        assert_eq!(BmiCategory::from_bmi(25.0), BmiCategory::Overweight);
        assert_eq!(BmiCategory::from_bmi(29.9), BmiCategory::Overweight);
        assert_eq!(BmiCategory::from_bmi(30.0), BmiCategory::Obese);
    }

    #[test]
    fn test_metric_bucketing_rounds_odd_scores_down() {
        assert_eq!(bucket_metric(7), 6);
        assert_eq!(bucket_metric(6), 6);
        assert_eq!(bucket_metric(0), 0);
        assert_eq!(bucket_metric(9), 8);
        assert_eq!(bucket_metric(10), 10);
        // Out-of-range input is clamped rather than overflowing the bucket
        assert_eq!(bucket_metric(13), 10);
    }

    #[test]
    fn test_worked_example_normalization() {
        // age 42, 82 kg at 178 cm, metrics {6, 4, 8, 7}
        let key = PatternKey::from_input(&sample_input());
        assert_eq!(key.age_decade, 40);
        assert_eq!(key.bmi_category, BmiCategory::Overweight);
        assert_eq!(key.metric_buckets, [6, 4, 8, 6]);
    }

    #[test]
    fn test_fingerprint_is_stable() {
        let a = PatternKey::from_input(&sample_input());
        let b = PatternKey::from_input(&sample_input());
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }

    #[test]
    fn test_fingerprint_collapses_equivalent_inputs() {
        // 41 and 42 share a decade; 7 and 6 share a metric bucket
        let mut other = sample_input();
        other.demographics.age = 41;
        other.health_metrics.nutrition = 6;
        let a = PatternKey::from_input(&sample_input());
        let b = PatternKey::from_input(&other);
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_fingerprint_separates_distinct_patterns() {
        let mut other = sample_input();
        other.health_metrics.sleep = 9;
        let a = PatternKey::from_input(&sample_input());
        let b = PatternKey::from_input(&other);
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}
