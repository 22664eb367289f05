//! Analysis result types
//!
//! The [`AnalysisResult`] is the single output shape of the pipeline,
//! whether it came from the LLM, the rule-based synthesizer, or the cache.
//! It is constructed once per request and treated as immutable afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fixed disclaimer attached to every analysis. Legally reviewed wording;
/// must never be blank on any path (LLM, fallback, cache hit or miss).
pub const DISCLAIMER: &str = "This analysis is generated for general wellness \
guidance only and is not medical advice. It does not diagnose, treat, or \
prevent any condition. Consult a qualified healthcare professional before \
making changes to your health routine.";

/// Letter grade on the A+..F scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    A,
    #[serde(rename = "B+")]
    BPlus,
    B,
    #[serde(rename = "C+")]
    CPlus,
    C,
    #[serde(rename = "D+")]
    DPlus,
    D,
    F,
}

impl Grade {
    /// Map an (unrounded) 0-100 score onto the grade ladder.
    ///
    /// Thresholds: 90 A+, 85 A, 80 B+, 70 B, 60 C+, 50 C, 40 D+, 30 D,
    /// everything below is F. The ladder is evaluated before any rounding so
    /// a score of 84.9999 grades B+, not A.
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            Self::APlus
        } else if score >= 85.0 {
            Self::A
        } else if score >= 80.0 {
            Self::BPlus
        } else if score >= 70.0 {
            Self::B
        } else if score >= 60.0 {
            Self::CPlus
        } else if score >= 50.0 {
            Self::C
        } else if score >= 40.0 {
            Self::DPlus
        } else if score >= 30.0 {
            Self::D
        } else {
            Self::F
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::APlus => "A+",
            Self::A => "A",
            Self::BPlus => "B+",
            Self::B => "B",
            Self::CPlus => "C+",
            Self::C => "C",
            Self::DPlus => "D+",
            Self::D => "D",
            Self::F => "F",
        }
    }
}

/// Risk classification of a single health area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// The four assessed health areas, in canonical order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthArea {
    Hydration,
    Sleep,
    Exercise,
    Nutrition,
}

impl HealthArea {
    /// Canonical ordering used for iteration and tie-breaking
    pub const ALL: [HealthArea; 4] = [
        HealthArea::Hydration,
        HealthArea::Sleep,
        HealthArea::Exercise,
        HealthArea::Nutrition,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hydration => "hydration",
            Self::Sleep => "sleep",
            Self::Exercise => "exercise",
            Self::Nutrition => "nutrition",
        }
    }
}

/// Per-area insight block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaInsight {
    /// Raw area score, 0-10
    pub score: u8,
    /// Grade for this area alone
    pub grade: Grade,
    /// Short narrative about the area
    pub insights: String,
    /// Concrete recommendations
    #[serde(default)]
    pub recommendations: Vec<String>,
    /// Risk classification derived from the score
    pub risk_level: RiskLevel,
    /// Smaller habit-level tips
    #[serde(default)]
    pub improvement_tips: Vec<String>,
}

/// One insight per assessed area
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaAnalysis {
    pub hydration: AreaInsight,
    pub sleep: AreaInsight,
    pub exercise: AreaInsight,
    pub nutrition: AreaInsight,
}

impl AreaAnalysis {
    pub fn get(&self, area: HealthArea) -> &AreaInsight {
        match area {
            HealthArea::Hydration => &self.hydration,
            HealthArea::Sleep => &self.sleep,
            HealthArea::Exercise => &self.exercise,
            HealthArea::Nutrition => &self.nutrition,
        }
    }
}

/// Complete analysis returned to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub overall_grade: Grade,
    /// Overall score, clamped to 0-100
    pub overall_score: u8,
    pub area_analysis: AreaAnalysis,
    /// Exactly three actions, most urgent first
    pub priority_actions: Vec<String>,
    #[serde(default)]
    pub risk_factors: Vec<String>,
    #[serde(default)]
    pub positive_aspects: Vec<String>,
    #[serde(default)]
    pub personalized_message: String,
    #[serde(default)]
    pub improvement_potential: String,
    #[serde(default)]
    pub key_insights: Vec<String>,
    /// Never empty; see [`DISCLAIMER`]
    pub disclaimer: String,
    pub generated_at: DateTime<Utc>,
    pub analysis_id: String,
    pub processing_time_ms: u64,
    /// Identifier of the model (or synthesizer) that produced the analysis
    pub model: String,
}
