//! Tailoring run: the orchestration driver behind both the HTTP endpoint
//! and the `run` CLI command.
//!
//! Flow: provision toolbox (stages inline resume) → assemble fresh agents →
//! run pipeline → release toolbox → shape the three outputs callers need.
//!
//! The toolbox is released on every exit path: `Pipeline::run` returns
//! failures as values, so nothing between provisioning and release can return
//! early.

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::crew::{Pipeline, PipelineFailure, PipelineResult, RunInputs, TaskKind};
use crate::errors::{is_rate_limited, AppError, UpstreamErrorKind};
use crate::state::AppState;
use crate::tools::{ResumeSource, ToolError, Toolbox};

/// Request body for `POST /api/tailor`.
#[derive(Debug, Clone, Deserialize)]
pub struct TailorRequest {
    pub job_posting_url: String,
    pub github_url: String,
    pub personal_writeup: String,
    pub resume_content: String,
}

impl TailorRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        for (field, value) in [
            ("job_posting_url", &self.job_posting_url),
            ("github_url", &self.github_url),
            ("personal_writeup", &self.personal_writeup),
            ("resume_content", &self.resume_content),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::Validation(format!("{field} cannot be empty")));
            }
        }
        Ok(())
    }

    pub fn into_inputs(self) -> RunInputs {
        RunInputs {
            job_posting_url: self.job_posting_url,
            github_url: self.github_url,
            personal_writeup: self.personal_writeup,
            resume: ResumeSource::Inline(self.resume_content),
        }
    }
}

/// What a caller gets back from a successful run.
#[derive(Debug, Clone)]
pub struct TailoredApplication {
    pub title: String,
    pub resume_strategy: String,
    pub interview_preparation: String,
    pub result: PipelineResult,
}

#[derive(Debug, Error)]
pub enum TailorError {
    #[error("failed to provision tools: {0}")]
    Provision(#[source] ToolError),

    #[error(transparent)]
    Pipeline(#[from] PipelineFailure),

    #[error("pipeline finished without output for '{0}'")]
    MissingOutput(TaskKind),
}

impl TailorError {
    pub fn kind(&self) -> UpstreamErrorKind {
        match self {
            TailorError::Provision(e) => e.kind(),
            TailorError::Pipeline(failure) => failure.error.kind(),
            TailorError::MissingOutput(_) => UpstreamErrorKind::Unknown,
        }
    }
}

impl From<TailorError> for AppError {
    fn from(err: TailorError) -> Self {
        let message = format!("An error occurred while running the crew: {err}");
        if is_rate_limited(err.kind(), &message) {
            AppError::RateLimited(message)
        } else {
            AppError::Internal(message)
        }
    }
}

/// Runs one tailoring pipeline with request-scoped agents and tools.
pub async fn tailor(state: &AppState, inputs: RunInputs) -> Result<TailoredApplication, TailorError> {
    let run_id = Uuid::new_v4();
    info!(%run_id, job_posting_url = %inputs.job_posting_url, "Starting tailoring run");

    let toolbox = Toolbox::provision(
        state.search.clone(),
        state.scrape.clone(),
        inputs.resume.clone(),
        state.config.resume_scratch_dir.as_deref(),
    )
    .map_err(TailorError::Provision)?;

    let pipeline = Pipeline::assemble(
        state.crew.clone(),
        state.llm.clone(),
        state.pipeline_settings(),
    );
    let outcome = pipeline.run(&inputs, &toolbox).await;
    toolbox.release();

    let result = outcome.map_err(|failure| {
        warn!(
            %run_id,
            completed = ?failure.partial.completed(),
            "Tailoring run failed at '{}'", failure.task
        );
        failure
    })?;

    let application = shape(result)?;
    info!(%run_id, title = %application.title, "Tailoring run completed");
    Ok(application)
}

fn shape(result: PipelineResult) -> Result<TailoredApplication, TailorError> {
    let title = result
        .research()
        .map(|r| r.title())
        .ok_or(TailorError::MissingOutput(TaskKind::Research))?;
    let resume_strategy = result
        .output(TaskKind::Strategize)
        .ok_or(TailorError::MissingOutput(TaskKind::Strategize))?
        .to_string();
    let interview_preparation = result
        .output(TaskKind::PrepareInterview)
        .ok_or(TailorError::MissingOutput(TaskKind::PrepareInterview))?
        .to_string();

    Ok(TailoredApplication {
        title,
        resume_strategy,
        interview_preparation,
        result,
    })
}
