//! Scoring prompt construction.
//!
//! `build_scoring_prompt` is pure and deterministic — same inputs always
//! produce the same string. No timestamps, no randomness.

use crate::ranking::models::ScoringWeights;

/// Scoring prompt template. Replace `{tech_skills}`, `{soft_skills}`,
/// `{weight_section}`, `{jd_text}` and `{resume_text}` before sending.
pub const SCORING_PROMPT_TEMPLATE: &str = r#"You are an expert technical recruiter. Score the candidate resume below against the job description.

Scoring rubric, applied in order:
1. Start from the base alignment between the resume and the job description.
2. Increment for each listed technical or soft skill with clear supporting evidence in the resume.
3. Adjust section emphasis according to the weighting instruction below.
4. Apply a small penalty if the candidate's stated location is clearly incompatible with the role.
5. Clamp the final score to the range [0.0, 1.0].

You MUST respond with valid JSON only.
Do NOT include any text outside the JSON object.
Do NOT use markdown code fences.

Return a JSON object with this EXACT schema:
{
  "candidate_name": "full name from the resume, or Unknown",
  "tech_skills_scores": {"<skill>": 0.0},
  "soft_skills_scores": {"<skill>": 0.0},
  "final_score": 0.0,
  "analysis": "2-3 sentence justification"
}
Every per-skill score and final_score must be between 0.0 and 1.0.

TECHNICAL SKILLS to evaluate: {tech_skills}
SOFT SKILLS to evaluate: {soft_skills}

{weight_section}

JOB DESCRIPTION:
{jd_text}

RESUME:
{resume_text}"#;

/// Builds the scoring prompt for one resume against one job description.
pub fn build_scoring_prompt(
    jd_text: &str,
    resume_text: &str,
    tech_skills: &[String],
    soft_skills: &[String],
    weights: &ScoringWeights,
) -> String {
    SCORING_PROMPT_TEMPLATE
        .replace("{tech_skills}", &format_skill_list(tech_skills))
        .replace("{soft_skills}", &format_skill_list(soft_skills))
        .replace("{weight_section}", &format_weight_section(weights))
        .replace("{jd_text}", jd_text)
        .replace("{resume_text}", resume_text)
}

/// Normalizes a skill list for the prompt: trim, lowercase, comma-joined.
/// An empty list renders as the literal `None`.
fn format_skill_list(skills: &[String]) -> String {
    let normalized: Vec<String> = skills
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();
    if normalized.is_empty() {
        "None".to_string()
    } else {
        normalized.join(", ")
    }
}

/// Renders the weighting instruction: one `Section: value` line per positive
/// weight, or a balanced-default instruction when no weight is set.
fn format_weight_section(weights: &ScoringWeights) -> String {
    let active = weights.active_sections();
    if active.is_empty() {
        return "Use balanced default weighting across all resume sections.".to_string();
    }
    let lines: Vec<String> = active
        .iter()
        .map(|(name, value)| format!("{name}: {value}"))
        .collect();
    format!(
        "SECTION WEIGHTS:\n{}\nWeight the sections listed above more heavily, in proportion to their values.",
        lines.join("\n")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skills(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let tech = skills(&["Rust", "Postgres"]);
        let soft = skills(&["communication"]);
        let weights = ScoringWeights {
            skills: 2.0,
            ..Default::default()
        };
        let a = build_scoring_prompt("backend role", "resume body", &tech, &soft, &weights);
        let b = build_scoring_prompt("backend role", "resume body", &tech, &soft, &weights);
        assert_eq!(a, b);
    }

    #[test]
    fn test_skill_lists_are_normalized_and_embedded() {
        let tech = skills(&["  Go ", "Postgres"]);
        let prompt = build_scoring_prompt("jd", "resume", &tech, &[], &ScoringWeights::default());
        assert!(prompt.contains("TECHNICAL SKILLS to evaluate: go, postgres"));
        assert!(prompt.contains("SOFT SKILLS to evaluate: None"));
    }

    #[test]
    fn test_empty_skill_list_renders_none() {
        assert_eq!(format_skill_list(&[]), "None");
        assert_eq!(format_skill_list(&skills(&["  ", ""])), "None");
    }

    #[test]
    fn test_positive_weights_render_one_line_each() {
        let weights = ScoringWeights {
            skills: 2.0,
            projects: 1.5,
            ..Default::default()
        };
        let section = format_weight_section(&weights);
        assert!(section.contains("Skills: 2"));
        assert!(section.contains("Projects: 1.5"));
        assert!(section.contains("more heavily"));
        assert!(!section.contains("Education"));
    }

    #[test]
    fn test_zero_weights_render_balanced_instruction() {
        let section = format_weight_section(&ScoringWeights::default());
        assert!(section.contains("balanced default weighting"));
        assert!(!section.contains("SECTION WEIGHTS"));
    }

    #[test]
    fn test_jd_and_resume_text_are_embedded_in_order() {
        let prompt = build_scoring_prompt(
            "Looking for a backend engineer",
            "Alice, Rust developer",
            &[],
            &[],
            &ScoringWeights::default(),
        );
        let jd_pos = prompt.find("Looking for a backend engineer").unwrap();
        let resume_pos = prompt.find("Alice, Rust developer").unwrap();
        assert!(jd_pos < resume_pos);
    }
}
