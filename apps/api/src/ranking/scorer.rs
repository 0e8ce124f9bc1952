//! Resume scoring — pluggable, trait-based scorer over the completion
//! provider.
//!
//! `AppState` carries an `Arc<dyn ResumeScorer>`, so tests (and any future
//! backend) swap implementations without touching handlers or the batch
//! orchestrator.
//!
//! The scorer is infallible by contract: transport failures and unparseable
//! replies degrade to an all-defaults record with a diagnostic analysis
//! string. Callers can always rely on receiving a well-formed record.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use crate::llm_client::CompletionClient;
use crate::ranking::decode::decode_object;
use crate::ranking::models::{clamp_final_score, ScoreRecord, ScoringWeights};
use crate::ranking::prompts::build_scoring_prompt;

/// Analysis string when the provider could not be reached at all.
pub const ANALYSIS_LLM_FAILED: &str = "LLM failed to respond";
/// Analysis string when the provider replied but nothing decoded.
pub const ANALYSIS_UNPARSEABLE: &str = "LLM returned an unparseable response";

#[async_trait]
pub trait ResumeScorer: Send + Sync {
    /// Scores one resume against one job description. Never fails — degraded
    /// paths return a record with default values.
    async fn score(
        &self,
        resume_text: &str,
        jd_text: &str,
        tech_skills: &[String],
        soft_skills: &[String],
        weights: &ScoringWeights,
    ) -> ScoreRecord;
}

/// Scorer backed by the completion provider.
pub struct LlmResumeScorer {
    client: CompletionClient,
}

impl LlmResumeScorer {
    pub fn new(client: CompletionClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResumeScorer for LlmResumeScorer {
    async fn score(
        &self,
        resume_text: &str,
        jd_text: &str,
        tech_skills: &[String],
        soft_skills: &[String],
        weights: &ScoringWeights,
    ) -> ScoreRecord {
        let prompt =
            build_scoring_prompt(jd_text, resume_text, tech_skills, soft_skills, weights);

        let raw = match self.client.complete(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("completion call failed for candidate Unknown: {e}");
                return fallback_record(ANALYSIS_LLM_FAILED);
            }
        };

        match decode_object(&raw) {
            Some(value) => {
                let record = record_from_value(&value);
                if record.final_score == 0.0 && record.analysis.is_empty() {
                    warn!(
                        "completion for candidate {} decoded but carried no score",
                        record.candidate_name
                    );
                }
                record
            }
            None => {
                warn!("undecodable completion for candidate Unknown: {raw:.120}");
                fallback_record(ANALYSIS_UNPARSEABLE)
            }
        }
    }
}

/// All-defaults record used on total failure.
pub fn fallback_record(analysis: &str) -> ScoreRecord {
    ScoreRecord {
        analysis: analysis.to_string(),
        ..Default::default()
    }
}

/// Populates a `ScoreRecord` field-by-field from a decoded object.
/// Missing or wrong-typed fields fall back to their defaults individually —
/// one bad field never poisons the rest of the record.
pub fn record_from_value(value: &Value) -> ScoreRecord {
    let candidate_name = value
        .get("candidate_name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or("Unknown")
        .to_string();

    let final_score = clamp_final_score(
        value
            .get("final_score")
            .and_then(Value::as_f64)
            .unwrap_or(0.0),
    );

    let analysis = value
        .get("analysis")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();

    ScoreRecord {
        candidate_name,
        tech_skills_scores: score_map(value.get("tech_skills_scores")),
        soft_skills_scores: score_map(value.get("soft_skills_scores")),
        final_score,
        analysis,
    }
}

/// Reads a per-skill score map, clamping every value into [0, 1] and
/// dropping non-numeric entries.
fn score_map(field: Option<&Value>) -> HashMap<String, f64> {
    field
        .and_then(Value::as_object)
        .map(|object| {
            object
                .iter()
                .filter_map(|(skill, v)| v.as_f64().map(|s| (skill.clone(), s.clamp(0.0, 1.0))))
                .collect()
        })
        .unwrap_or_default()
}
