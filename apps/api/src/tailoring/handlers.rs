//! Axum route handlers for the Tailoring API.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::errors::AppError;
use crate::state::AppState;
use crate::tailoring::service::{tailor, TailorRequest};

// ────────────────────────────────────────────────────────────────────────────
// Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct TailorData {
    pub title: String,
    pub resume_strategy_task: String,
    pub interview_preparation_task: String,
}

#[derive(Debug, Serialize)]
pub struct TailorResponse {
    pub status: &'static str,
    pub message: String,
    pub data: TailorData,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/tailor
///
/// Runs the full research → profile → strategy → interview pipeline for one
/// candidate and job posting. Blocks until the pipeline finishes.
pub async fn handle_tailor(
    State(state): State<AppState>,
    Json(request): Json<TailorRequest>,
) -> Result<Json<TailorResponse>, AppError> {
    request.validate()?;

    let application = tailor(&state, request.into_inputs()).await?;

    Ok(Json(TailorResponse {
        status: "success",
        message: format!("Tailored application ready for {}", application.title),
        data: TailorData {
            title: application.title,
            resume_strategy_task: application.resume_strategy,
            interview_preparation_task: application.interview_preparation,
        },
    }))
}
