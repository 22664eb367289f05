//! LLM prompt construction

use crate::core::pattern::BmiCategory;
use crate::core::types::AnalysisInput;
use std::fmt::Write;

/// System prompt pinning the response contract
pub const SYSTEM_PROMPT: &str = "You are a wellness analyst. Respond with a single JSON \
object and nothing else. Required fields: overall_grade (one of A+, A, B+, B, C+, C, D+, D, F), \
overall_score (0-100), area_analysis (objects for hydration, sleep, exercise and nutrition, \
each with score, grade, insights, recommendations, risk_level and improvement_tips), \
priority_actions (exactly 3 strings). Optional fields: risk_factors, positive_aspects, \
personalized_message, improvement_potential, key_insights, disclaimer.";

/// Build the user prompt from demographics, BMI, metric scores, and a capped
/// slice of the raw answers. The cap keeps prompt growth bounded regardless
/// of questionnaire length.
pub fn build_analysis_prompt(input: &AnalysisInput, max_answers: usize) -> String {
    let d = &input.demographics;
    let m = &input.health_metrics;
    let bmi = d.bmi();

    let mut prompt = format!(
        "Analyze this {} assessment.\n\
         Profile: age {}, gender {}, weight {:.1} kg, height {:.1} cm, BMI {:.1} ({}).\n\
         Scores (0-10): hydration {}, sleep {}, exercise {}, nutrition {}.\n",
        input.assessment_type.as_str(),
        d.age,
        d.gender.as_str(),
        d.weight_kg,
        d.height_cm,
        bmi,
        BmiCategory::from_bmi(bmi).as_str(),
        m.hydration,
        m.sleep,
        m.exercise,
        m.nutrition,
    );

    if !input.answers.is_empty() {
        prompt.push_str("Questionnaire answers:\n");
        for answer in input.answers.iter().take(max_answers) {
            match &answer.category {
                Some(category) => {
                    let _ = writeln!(
                        prompt,
                        "- [{}] {}: {}",
                        category, answer.question_id, answer.answer
                    );
                }
                None => {
                    let _ = writeln!(prompt, "- {}: {}", answer.question_id, answer.answer);
                }
            }
        }
        if input.answers.len() > max_answers {
            let _ = writeln!(
                prompt,
                "({} further answers omitted)",
                input.answers.len() - max_answers
            );
        }
    }

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Answer;
    use crate::core::types::test_support::sample_input;

    #[test]
    fn test_prompt_embeds_profile_and_scores() {
        let prompt = build_analysis_prompt(&sample_input(), 10);
        assert!(prompt.contains("age 42"));
        assert!(prompt.contains("BMI 25.9 (overweight)"));
        assert!(prompt.contains("sleep 4"));
        assert!(prompt.contains("six hours"));
    }

    #[test]
    fn test_answer_cap_bounds_prompt_growth() {
        let mut input = sample_input();
        input.answers = (0..50)
            .map(|i| Answer {
                question_id: format!("q{}", i),
                answer: "yes".to_string(),
                category: None,
            })
            .collect();

        let prompt = build_analysis_prompt(&input, 10);
        assert!(prompt.contains("q9"));
        assert!(!prompt.contains("q10:"));
        assert!(prompt.contains("40 further answers omitted"));
    }
}
