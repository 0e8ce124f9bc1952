//! Batch ranking — orchestrates the per-file pipeline over every uploaded
//! resume.
//!
//! Flow: validate input → parse skill CSVs once → fan out one task per file
//! (extract, then score — strictly in that order within a file) → reassemble
//! in input order → stable sort by final score descending → truncate to
//! `top_n`.
//!
//! One file's failure never aborts the batch: extraction and scoring both
//! degrade locally, and a panicked task is replaced by the all-defaults
//! record tagged with the real file name.

use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::ranking::extractor::extract;
use crate::ranking::models::{
    RankedResult, ScoringWeights, UploadedResume, EMAIL_NOT_FOUND,
};
use crate::ranking::scorer::{fallback_record, ResumeScorer, ANALYSIS_LLM_FAILED};

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// Validated input for one ranking run, as assembled by the HTTP boundary.
#[derive(Debug)]
pub struct RankRequest {
    pub files: Vec<UploadedResume>,
    pub jd_text: String,
    /// Comma-separated, normalized here before distribution.
    pub tech_skills: String,
    pub soft_skills: String,
    pub weights: ScoringWeights,
    pub top_n: Option<usize>,
}

/// Outbound payload: ranked results plus the normalized skill lists used,
/// echoed back so the caller can display them.
#[derive(Debug, Serialize)]
pub struct RankResponse {
    pub results: Vec<RankedResult>,
    pub tech_skills: Vec<String>,
    pub soft_skills: Vec<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Orchestration
// ────────────────────────────────────────────────────────────────────────────

/// Runs the full ranking pipeline over a batch of uploaded resumes.
pub async fn rank_resumes(
    scorer: Arc<dyn ResumeScorer>,
    request: RankRequest,
) -> Result<RankResponse, AppError> {
    if request.jd_text.trim().is_empty() {
        return Err(AppError::Validation(
            "job_description cannot be empty".to_string(),
        ));
    }
    if request.files.is_empty() {
        return Err(AppError::Validation(
            "at least one resume file is required".to_string(),
        ));
    }

    // The same normalized skill lists are reused across the whole batch.
    let tech_skills = Arc::new(parse_skill_list(&request.tech_skills));
    let soft_skills = Arc::new(parse_skill_list(&request.soft_skills));
    let jd_text: Arc<str> = Arc::from(request.jd_text.as_str());
    let weights = request.weights;

    info!(
        "ranking {} resumes ({} tech skills, {} soft skills)",
        request.files.len(),
        tech_skills.len(),
        soft_skills.len()
    );

    let file_names: Vec<String> = request.files.iter().map(|f| f.file_name.clone()).collect();

    let mut join_set = JoinSet::new();
    for (index, file) in request.files.into_iter().enumerate() {
        let scorer = Arc::clone(&scorer);
        let jd_text = Arc::clone(&jd_text);
        let tech_skills = Arc::clone(&tech_skills);
        let soft_skills = Arc::clone(&soft_skills);
        join_set.spawn(async move {
            let result =
                process_file(file, scorer.as_ref(), &jd_text, &tech_skills, &soft_skills, &weights)
                    .await;
            (index, result)
        });
    }

    // Reassemble in input order so ties keep encounter order under the
    // stable sort below, independent of completion timing.
    let mut slots: Vec<Option<RankedResult>> = file_names.iter().map(|_| None).collect();
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((index, result)) => slots[index] = Some(result),
            Err(e) => warn!("resume pipeline task failed: {e}"),
        }
    }

    let results: Vec<RankedResult> = slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| {
            slot.unwrap_or_else(|| RankedResult {
                score: fallback_record(ANALYSIS_LLM_FAILED),
                file_name: file_names[index].clone(),
                email: EMAIL_NOT_FOUND.to_string(),
            })
        })
        .collect();

    Ok(RankResponse {
        results: sort_and_truncate(results, request.top_n),
        tech_skills: tech_skills.as_ref().clone(),
        soft_skills: soft_skills.as_ref().clone(),
    })
}

/// The per-file pipeline: extraction must complete before the scoring call.
async fn process_file(
    file: UploadedResume,
    scorer: &dyn ResumeScorer,
    jd_text: &str,
    tech_skills: &[String],
    soft_skills: &[String],
    weights: &ScoringWeights,
) -> RankedResult {
    let document = extract(&file).await;
    let score = scorer
        .score(&document.text, jd_text, tech_skills, soft_skills, weights)
        .await;
    RankedResult {
        score,
        file_name: document.file_name,
        email: document.email,
    }
}

/// Parses a comma-separated skill string: trim, lowercase, drop empties.
/// Order is preserved; duplicates are kept.
pub fn parse_skill_list(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Stable sort by final score descending, then truncate to a positive
/// `top_n`. Ties keep their input order.
fn sort_and_truncate(mut results: Vec<RankedResult>, top_n: Option<usize>) -> Vec<RankedResult> {
    results.sort_by(|a, b| b.score.final_score.total_cmp(&a.score.final_score));
    if let Some(top_n) = top_n {
        if top_n > 0 {
            results.truncate(top_n);
        }
    }
    results
}
