//! Rule-based analysis synthesizer
//!
//! Deterministic, network-free generator used whenever the LLM path is
//! unavailable or returns an invalid payload. Every template branches only
//! on the area score, the age decade, and the BMI category, so two identical
//! inputs always produce the same grades, messages, and actions.

use crate::core::pattern::BmiCategory;
use crate::core::result::{
    AnalysisResult, AreaAnalysis, AreaInsight, DISCLAIMER, Grade, HealthArea, RiskLevel,
};
use crate::core::types::AnalysisInput;
use crate::utils::generate_analysis_id;

/// Model identifier stamped on synthesized results
pub const FALLBACK_MODEL: &str = "rule-based-v1";

/// Score bands driving every template branch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScoreBand {
    Poor,      // 0-3
    Fair,      // 4-6
    Good,      // 7-8
    Excellent, // 9-10
}

fn band(score: u8) -> ScoreBand {
    match score {
        0..=3 => ScoreBand::Poor,
        4..=6 => ScoreBand::Fair,
        7..=8 => ScoreBand::Good,
        _ => ScoreBand::Excellent,
    }
}

fn risk_level(score: u8) -> RiskLevel {
    match score {
        0..=3 => RiskLevel::High,
        4..=6 => RiskLevel::Medium,
        _ => RiskLevel::Low,
    }
}

/// Synthesize a complete analysis from the input alone. Cannot fail.
pub fn synthesize(input: &AnalysisInput) -> AnalysisResult {
    let metrics = input.health_metrics;
    let age_decade = (input.demographics.age / 10) * 10;
    let bmi_category = BmiCategory::from_bmi(input.demographics.bmi());

    let average = metrics.average();
    let overall_score = (average * 10.0).round().min(100.0) as u8;
    let overall_grade = Grade::from_score(average * 10.0);

    let scores = metrics.as_array();
    let area_analysis = AreaAnalysis {
        hydration: area_insight(HealthArea::Hydration, scores[0], age_decade, bmi_category),
        sleep: area_insight(HealthArea::Sleep, scores[1], age_decade, bmi_category),
        exercise: area_insight(HealthArea::Exercise, scores[2], age_decade, bmi_category),
        nutrition: area_insight(HealthArea::Nutrition, scores[3], age_decade, bmi_category),
    };

    let ranked = ranked_areas(&scores);

    AnalysisResult {
        overall_grade,
        overall_score,
        area_analysis,
        priority_actions: priority_actions(&ranked, input.demographics.age),
        risk_factors: risk_factors(&ranked, bmi_category),
        positive_aspects: positive_aspects(&ranked),
        personalized_message: personalized_message(age_decade, bmi_category, overall_score),
        improvement_potential: improvement_potential(&ranked, &scores),
        key_insights: key_insights(&ranked, bmi_category),
        disclaimer: DISCLAIMER.to_string(),
        generated_at: chrono::Utc::now(),
        analysis_id: generate_analysis_id(),
        processing_time_ms: 0,
        model: FALLBACK_MODEL.to_string(),
    }
}

/// Areas sorted ascending by raw score; ties keep the canonical area order
fn ranked_areas(scores: &[u8; 4]) -> Vec<(HealthArea, u8)> {
    let mut ranked: Vec<(HealthArea, u8)> = HealthArea::ALL
        .iter()
        .zip(scores.iter())
        .map(|(&area, &score)| (area, score))
        .collect();
    ranked.sort_by_key(|&(_, score)| score);
    ranked
}

fn area_insight(
    area: HealthArea,
    score: u8,
    age_decade: u32,
    bmi_category: BmiCategory,
) -> AreaInsight {
    let (insight, recommendations, improvement_tips) = area_templates(area, band(score), score);
    let mut insights = insight;
    if let Some(note) = demographic_note(area, age_decade, bmi_category) {
        insights.push(' ');
        insights.push_str(note);
    }

    AreaInsight {
        score,
        grade: Grade::from_score(score as f64 * 10.0),
        insights,
        recommendations,
        risk_level: risk_level(score),
        improvement_tips,
    }
}

/// Base narrative, recommendations, and tips for an area at a given band
fn area_templates(
    area: HealthArea,
    band: ScoreBand,
    score: u8,
) -> (String, Vec<String>, Vec<String>) {
    let name = area.as_str();
    let insight = match band {
        ScoreBand::Poor => format!(
            "Your {} score of {}/10 points to a significant gap that is likely \
             affecting your daily energy and recovery.",
            name, score
        ),
        ScoreBand::Fair => format!(
            "Your {} score of {}/10 is a workable base, but inconsistency is \
             holding this area back.",
            name, score
        ),
        ScoreBand::Good => format!(
            "Your {} score of {}/10 reflects solid habits in this area with \
             room for fine-tuning.",
            name, score
        ),
        ScoreBand::Excellent => format!(
            "Your {} score of {}/10 puts this area among your strengths - the \
             goal now is protecting the routine.",
            name, score
        ),
    };

    let recommendations = match (area, band) {
        (HealthArea::Hydration, ScoreBand::Poor | ScoreBand::Fair) => vec![
            "Keep a filled water bottle within reach during work hours".to_string(),
            "Drink a glass of water with every meal and snack".to_string(),
        ],
        (HealthArea::Hydration, _) => {
            vec!["Maintain your current intake and adjust upward on active days".to_string()]
        }
        (HealthArea::Sleep, ScoreBand::Poor | ScoreBand::Fair) => vec![
            "Set a fixed wind-down time and keep screens out of the last hour".to_string(),
            "Target 7-9 hours and keep wake time constant, including weekends".to_string(),
        ],
        (HealthArea::Sleep, _) => {
            vec!["Guard your existing sleep window against schedule creep".to_string()]
        }
        (HealthArea::Exercise, ScoreBand::Poor | ScoreBand::Fair) => vec![
            "Schedule three 30-minute movement sessions per week".to_string(),
            "Favor activities you can sustain: walking, cycling, swimming".to_string(),
        ],
        (HealthArea::Exercise, _) => {
            vec!["Add variety or intensity progression to avoid plateaus".to_string()]
        }
        (HealthArea::Nutrition, ScoreBand::Poor | ScoreBand::Fair) => vec![
            "Plan meals ahead and anchor each around vegetables and protein".to_string(),
            "Reduce ultra-processed snacks by keeping whole-food options visible".to_string(),
        ],
        (HealthArea::Nutrition, _) => {
            vec!["Keep your plate pattern steady and review portions seasonally".to_string()]
        }
    };

    let improvement_tips = match band {
        ScoreBand::Poor => vec![
            format!("Pick one {} habit and repeat it daily for two weeks", name),
            "Track the habit somewhere visible; streaks beat willpower".to_string(),
        ],
        ScoreBand::Fair => vec![format!(
            "Identify the weekday where your {} routine slips and plan around it",
            name
        )],
        ScoreBand::Good | ScoreBand::Excellent => {
            vec!["Review this area monthly so it stays a strength".to_string()]
        }
    };

    (insight, recommendations, improvement_tips)
}

/// Age- and BMI-conditioned qualifier appended to the area narrative
fn demographic_note(
    area: HealthArea,
    age_decade: u32,
    bmi_category: BmiCategory,
) -> Option<&'static str> {
    match area {
        HealthArea::Exercise
            if matches!(bmi_category, BmiCategory::Overweight | BmiCategory::Obese) =>
        {
            Some("Regular movement is especially valuable at your current BMI range.")
        }
        HealthArea::Nutrition if bmi_category == BmiCategory::Underweight => {
            Some("Favor nutrient-dense calories to support a BMI below the healthy range.")
        }
        HealthArea::Sleep if age_decade >= 60 => {
            Some("Sleep architecture shifts with age, so consistency matters more each decade.")
        }
        HealthArea::Hydration if age_decade >= 50 => {
            Some("Thirst signals weaken with age; schedule water rather than waiting for thirst.")
        }
        _ => None,
    }
}

/// Templated action for a single area
fn area_action(area: HealthArea) -> &'static str {
    match area {
        HealthArea::Hydration => {
            "Increase your daily water intake gradually, aiming for eight glasses spread across the day"
        }
        HealthArea::Sleep => {
            "Establish a consistent sleep schedule targeting 7-9 hours per night"
        }
        HealthArea::Exercise => {
            "Add three 30-minute movement sessions to your week and build from there"
        }
        HealthArea::Nutrition => {
            "Plan balanced meals ahead of time, anchoring each around vegetables and protein"
        }
    }
}

/// Exactly three actions: lowest area, second-lowest area, one age-conditioned
fn priority_actions(ranked: &[(HealthArea, u8)], age: u32) -> Vec<String> {
    let age_action = if age > 40 {
        "Schedule a preventive health screening to establish your current baselines"
    } else {
        "Pick one small daily habit in your weakest area and track it for 30 days"
    };

    vec![
        area_action(ranked[0].0).to_string(),
        area_action(ranked[1].0).to_string(),
        age_action.to_string(),
    ]
}

fn risk_factors(ranked: &[(HealthArea, u8)], bmi_category: BmiCategory) -> Vec<String> {
    let mut factors: Vec<String> = ranked
        .iter()
        .filter(|&&(_, score)| score <= 3)
        .map(|&(area, score)| format!("Low {} score ({}/10)", area.as_str(), score))
        .collect();

    match bmi_category {
        BmiCategory::Obese => factors.push("BMI in the obese range".to_string()),
        BmiCategory::Underweight => factors.push("BMI below the healthy range".to_string()),
        _ => {}
    }

    factors
}

fn positive_aspects(ranked: &[(HealthArea, u8)]) -> Vec<String> {
    let strong: Vec<String> = ranked
        .iter()
        .filter(|&&(_, score)| score >= 8)
        .map(|&(area, score)| format!("Strong {} habits ({}/10)", area.as_str(), score))
        .collect();

    if strong.is_empty() {
        vec![
            "You completed a full assessment, which is the first step toward targeted improvement"
                .to_string(),
        ]
    } else {
        strong
    }
}

fn personalized_message(age_decade: u32, bmi_category: BmiCategory, overall_score: u8) -> String {
    let age_phrase = if age_decade >= 20 {
        format!("in your {}s", age_decade)
    } else {
        "at your age".to_string()
    };

    let closer = if overall_score >= 85 {
        "Keep protecting the routines that are working for you."
    } else if overall_score >= 70 {
        "A few focused adjustments would compound quickly from here."
    } else if overall_score >= 50 {
        "Steady, small changes in your weakest areas will move this score fastest."
    } else {
        "Start with a single area; momentum matters more than perfection."
    };

    format!(
        "For someone {} with a BMI in the {} range, an overall wellness score of {} is a \
         useful starting point. {}",
        age_phrase,
        bmi_category.as_str(),
        overall_score,
        closer
    )
}

/// Projects the score if the two weakest areas each improved by two points
fn improvement_potential(ranked: &[(HealthArea, u8)], scores: &[u8; 4]) -> String {
    let total: u32 = scores.iter().map(|&s| s as u32).sum();
    let lift = (10 - ranked[0].1.min(8)) as u32;
    let lift2 = (10 - ranked[1].1.min(8)) as u32;
    let projected = (((total + lift.min(2) + lift2.min(2)) as f64 / 4.0) * 10.0).round();
    format!(
        "Raising your {} and {} scores by two points each would lift your overall score to \
         about {}",
        ranked[0].0.as_str(),
        ranked[1].0.as_str(),
        projected.min(100.0) as u8
    )
}

fn key_insights(ranked: &[(HealthArea, u8)], bmi_category: BmiCategory) -> Vec<String> {
    let (weakest, weakest_score) = ranked[0];
    let (strongest, strongest_score) = ranked[ranked.len() - 1];

    let mut insights = vec![
        format!(
            "Your biggest opportunity is {} at {}/10",
            weakest.as_str(),
            weakest_score
        ),
        format!(
            "Your strongest area is {} at {}/10",
            strongest.as_str(),
            strongest_score
        ),
    ];

    if bmi_category != BmiCategory::Normal {
        insights.push(format!(
            "Your BMI falls in the {} range, which shapes the recommendations above",
            bmi_category.as_str()
        ));
    }

    insights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::test_support::sample_input;
    use crate::core::types::{AnalysisInput, HealthMetrics};

    fn with_metrics(metrics: HealthMetrics) -> AnalysisInput {
        let mut input = sample_input();
        input.health_metrics = metrics;
        input
    }

    #[test]
    fn test_synthesis_is_deterministic() {
        let first = synthesize(&sample_input());
        let second = synthesize(&sample_input());
        // Timestamps and ids differ; everything user-facing must not
        assert_eq!(first.overall_grade, second.overall_grade);
        assert_eq!(first.overall_score, second.overall_score);
        assert_eq!(first.priority_actions, second.priority_actions);
        assert_eq!(first.area_analysis, second.area_analysis);
        assert_eq!(first.risk_factors, second.risk_factors);
        assert_eq!(first.personalized_message, second.personalized_message);
    }

    #[test]
    fn test_worked_scenario() {
        // metrics {6, 4, 8, 7} -> average 6.25 -> score 63, grade C+
        let result = synthesize(&sample_input());
        assert_eq!(result.overall_score, 63);
        assert_eq!(result.overall_grade, Grade::CPlus);

        // Sleep (4) is the weakest area, hydration (6) the runner-up
        assert_eq!(result.priority_actions.len(), 3);
        assert!(result.priority_actions[0].contains("sleep"));
        assert!(result.priority_actions[1].contains("water"));
        // age 42 -> screening action
        assert!(result.priority_actions[2].contains("screening"));
    }

    #[test]
    fn test_habit_action_for_younger_users() {
        let mut input = sample_input();
        input.demographics.age = 31;
        let result = synthesize(&input);
        assert!(result.priority_actions[2].contains("30 days"));
    }

    #[test]
    fn test_extreme_scores() {
        let perfect = synthesize(&with_metrics(HealthMetrics {
            hydration: 10,
            sleep: 10,
            exercise: 10,
            nutrition: 10,
        }));
        assert_eq!(perfect.overall_score, 100);
        assert_eq!(perfect.overall_grade, Grade::APlus);

        let empty = synthesize(&with_metrics(HealthMetrics {
            hydration: 0,
            sleep: 0,
            exercise: 0,
            nutrition: 0,
        }));
        assert_eq!(empty.overall_score, 0);
        assert_eq!(empty.overall_grade, Grade::F);
    }

    #[test]
    fn test_risk_levels_follow_bands() {
        let result = synthesize(&sample_input());
        assert_eq!(result.area_analysis.sleep.risk_level, RiskLevel::Medium);
        assert_eq!(result.area_analysis.exercise.risk_level, RiskLevel::Low);

        let poor = synthesize(&with_metrics(HealthMetrics {
            hydration: 2,
            sleep: 5,
            exercise: 9,
            nutrition: 5,
        }));
        assert_eq!(poor.area_analysis.hydration.risk_level, RiskLevel::High);
        assert!(
            poor.risk_factors
                .iter()
                .any(|f| f.contains("hydration"))
        );
    }

    #[test]
    fn test_tie_breaking_follows_canonical_order() {
        // hydration and sleep tie at 4; hydration is first in canonical order
        let result = synthesize(&with_metrics(HealthMetrics {
            hydration: 4,
            sleep: 4,
            exercise: 8,
            nutrition: 8,
        }));
        assert!(result.priority_actions[0].contains("water"));
        assert!(result.priority_actions[1].contains("sleep"));
    }

    #[test]
    fn test_disclaimer_always_present() {
        for metrics in [
            HealthMetrics { hydration: 0, sleep: 0, exercise: 0, nutrition: 0 },
            HealthMetrics { hydration: 10, sleep: 10, exercise: 10, nutrition: 10 },
            HealthMetrics { hydration: 3, sleep: 7, exercise: 5, nutrition: 9 },
        ] {
            let result = synthesize(&with_metrics(metrics));
            assert!(!result.disclaimer.is_empty());
        }
    }

    #[test]
    fn test_model_stamp() {
        let result = synthesize(&sample_input());
        assert_eq!(result.model, FALLBACK_MODEL);
        assert!(result.analysis_id.starts_with("analysis_"));
    }

    #[test]
    fn test_positive_aspects_never_empty() {
        let result = synthesize(&with_metrics(HealthMetrics {
            hydration: 1,
            sleep: 2,
            exercise: 3,
            nutrition: 2,
        }));
        assert!(!result.positive_aspects.is_empty());
    }
}
