//! Axum route handlers for the ranking API.

use std::sync::Arc;

use axum::extract::multipart::Field;
use axum::extract::{Multipart, State};
use axum::Json;
use bytes::Bytes;
use tracing::debug;

use crate::errors::AppError;
use crate::ranking::models::{ScoringWeights, UploadedResume};
use crate::ranking::ranker::{rank_resumes, RankRequest, RankResponse};
use crate::state::AppState;

/// POST /api/v1/rank
///
/// Multipart form: repeated `resumes` file parts plus text fields
/// `job_description`, `tech_skills`, `soft_skills`, the five `weight_*`
/// fields and `top_n`. Unknown fields are ignored.
pub async fn handle_rank(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<RankResponse>, AppError> {
    let mut request = RankRequest {
        files: Vec::new(),
        jd_text: String::new(),
        tech_skills: String::new(),
        soft_skills: String::new(),
        weights: ScoringWeights::default(),
        top_n: None,
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))?
    {
        let Some(name) = field.name().map(String::from) else {
            continue;
        };
        match name.as_str() {
            "resumes" => {
                let file_name = field
                    .file_name()
                    .map(String::from)
                    .unwrap_or_else(|| format!("resume-{}", request.files.len() + 1));
                let content_type = field.content_type().map(String::from);
                let content: Bytes = field.bytes().await.map_err(|e| {
                    AppError::Validation(format!("failed to read file '{file_name}': {e}"))
                })?;
                request.files.push(UploadedResume {
                    file_name,
                    content_type,
                    content,
                });
            }
            "job_description" => request.jd_text = text_field(field, &name).await?,
            "tech_skills" => request.tech_skills = text_field(field, &name).await?,
            "soft_skills" => request.soft_skills = text_field(field, &name).await?,
            "weight_skills" => request.weights.skills = weight_field(field, &name).await?,
            "weight_experience" => {
                request.weights.experience = weight_field(field, &name).await?
            }
            "weight_education" => request.weights.education = weight_field(field, &name).await?,
            "weight_projects" => request.weights.projects = weight_field(field, &name).await?,
            "weight_achievements" => {
                request.weights.achievements = weight_field(field, &name).await?
            }
            "top_n" => request.top_n = top_n_field(field, &name).await?,
            _ => debug!("ignoring unknown multipart field '{name}'"),
        }
    }

    let response = rank_resumes(Arc::clone(&state.scorer), request).await?;
    Ok(Json(response))
}

async fn text_field(field: Field<'_>, name: &str) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("failed to read field '{name}': {e}")))
}

/// Numeric weight field; blank values mean "unset" and stay at 0.
async fn weight_field(field: Field<'_>, name: &str) -> Result<f64, AppError> {
    let raw = text_field(field, name).await?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0.0);
    }
    trimmed.parse::<f64>().map_err(|_| {
        AppError::Validation(format!("field '{name}' must be a number, got '{trimmed}'"))
    })
}

async fn top_n_field(field: Field<'_>, name: &str) -> Result<Option<usize>, AppError> {
    let raw = text_field(field, name).await?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed.parse::<usize>().map(Some).map_err(|_| {
        AppError::Validation(format!(
            "field '{name}' must be a non-negative integer, got '{trimmed}'"
        ))
    })
}
