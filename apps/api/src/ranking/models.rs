//! Data types shared across the ranking pipeline.

use std::collections::HashMap;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Email sentinel when the extracted text contains no address.
pub const EMAIL_NOT_FOUND: &str = "Not Found";
/// Email sentinel for files the extractor does not understand.
pub const UNSUPPORTED_FILE_TYPE: &str = "Unsupported file type";

/// An uploaded resume as handed over by the HTTP layer.
///
/// The core reads it once and never mutates it. `content_type` is the
/// declared multipart type — logged for diagnostics only; the extraction
/// path is chosen by filename suffix to tolerate mislabeled uploads.
#[derive(Debug, Clone)]
pub struct UploadedResume {
    pub file_name: String,
    pub content_type: Option<String>,
    pub content: Bytes,
}

/// Result of text extraction for one file.
///
/// `email` is always a detected address or one of the sentinels above —
/// never empty. Consumed immediately by the scoring call.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    pub file_name: String,
    pub text: String,
    pub email: String,
}

/// Per-section scoring weights. All default to 0; a section is rendered
/// into the prompt only when its weight is > 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    #[serde(default)]
    pub skills: f64,
    #[serde(default)]
    pub experience: f64,
    #[serde(default)]
    pub education: f64,
    #[serde(default)]
    pub projects: f64,
    #[serde(default)]
    pub achievements: f64,
}

impl ScoringWeights {
    /// Sections with a positive weight, in fixed render order.
    pub fn active_sections(&self) -> Vec<(&'static str, f64)> {
        [
            ("Skills", self.skills),
            ("Experience", self.experience),
            ("Education", self.education),
            ("Projects", self.projects),
            ("Achievements", self.achievements),
        ]
        .into_iter()
        .filter(|(_, w)| *w > 0.0)
        .collect()
    }
}

/// Structured result of scoring one resume against one job description.
///
/// Every field has a safe default so a malformed provider response degrades
/// values without ever dropping keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub candidate_name: String,
    pub tech_skills_scores: HashMap<String, f64>,
    pub soft_skills_scores: HashMap<String, f64>,
    /// In [0.0, 1.0], rounded to 2 decimal places.
    pub final_score: f64,
    pub analysis: String,
}

impl Default for ScoreRecord {
    fn default() -> Self {
        Self {
            candidate_name: "Unknown".to_string(),
            tech_skills_scores: HashMap::new(),
            soft_skills_scores: HashMap::new(),
            final_score: 0.0,
            analysis: String::new(),
        }
    }
}

/// Clamps a raw provider score into [0, 1] and rounds to 2 decimals.
pub fn clamp_final_score(raw: f64) -> f64 {
    (raw.clamp(0.0, 1.0) * 100.0).round() / 100.0
}

/// A `ScoreRecord` enriched with the originating file's name and detected
/// email, as it appears in the final sorted output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedResult {
    #[serde(flatten)]
    pub score: ScoreRecord,
    pub file_name: String,
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_default_to_zero_and_render_nothing() {
        let weights = ScoringWeights::default();
        assert!(weights.active_sections().is_empty());
    }

    #[test]
    fn test_active_sections_keeps_only_positive_weights() {
        let weights = ScoringWeights {
            skills: 2.0,
            education: 1.0,
            ..Default::default()
        };
        let sections = weights.active_sections();
        assert_eq!(sections, vec![("Skills", 2.0), ("Education", 1.0)]);
    }

    #[test]
    fn test_score_record_default_shape() {
        let record = ScoreRecord::default();
        assert_eq!(record.candidate_name, "Unknown");
        assert!(record.tech_skills_scores.is_empty());
        assert!(record.soft_skills_scores.is_empty());
        assert_eq!(record.final_score, 0.0);
        assert!(record.analysis.is_empty());
    }

    #[test]
    fn test_clamp_final_score_bounds_and_rounds() {
        assert_eq!(clamp_final_score(1.7), 1.0);
        assert_eq!(clamp_final_score(-0.3), 0.0);
        assert_eq!(clamp_final_score(0.456), 0.46);
        assert_eq!(clamp_final_score(0.7), 0.7);
    }

    #[test]
    fn test_ranked_result_flattens_score_fields() {
        let result = RankedResult {
            score: ScoreRecord {
                final_score: 0.75,
                ..Default::default()
            },
            file_name: "alice.pdf".to_string(),
            email: "alice@x.com".to_string(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["final_score"], 0.75);
        assert_eq!(json["candidate_name"], "Unknown");
        assert_eq!(json["file_name"], "alice.pdf");
        assert_eq!(json["email"], "alice@x.com");
    }
}
