//! Task pipeline: runs the declared tasks strictly in order.
//!
//! Flow per task: render description → append upstream context (declaration
//! order) → agent tool loop under a timeout → validate structured output →
//! persist artifact (optional) → record result.
//!
//! The first failing task aborts the run. Completed results are handed back in
//! `PipelineFailure::partial` so callers decide how to degrade.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::crew::agent::Agent;
use crate::crew::definitions::CrewDefinition;
use crate::crew::prompts::{CONTEXT_HEADER, RESEARCH_OUTPUT_SCHEMA};
use crate::crew::research::{parse_research, JobResearch};
use crate::crew::roles::AgentRole;
use crate::crew::tasks::{RunInputs, TaskKind, TaskSpec};
use crate::errors::UpstreamErrorKind;
use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;
use crate::llm_client::{LanguageModel, LlmError};
use crate::tools::{ToolError, Toolbox};

pub const DEFAULT_TASK_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("model call failed: {0}")]
    Model(#[from] LlmError),

    #[error("tool call failed: {0}")]
    Tool(#[from] ToolError),

    #[error("invalid output: {0}")]
    InvalidOutput(String),

    #[error("task timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("agent gave no final answer within {0} iterations")]
    IterationLimit(usize),

    #[error("context from '{0}' is not available")]
    MissingContext(TaskKind),

    #[error("no agent is bound to role '{0}'")]
    UnboundAgent(AgentRole),

    #[error("failed to write artifact {}: {source}", .path.display())]
    Artifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TaskError {
    pub fn kind(&self) -> UpstreamErrorKind {
        match self {
            TaskError::Model(e) => e.kind(),
            TaskError::Tool(e) => e.kind(),
            TaskError::InvalidOutput(_) | TaskError::IterationLimit(_) => {
                UpstreamErrorKind::Invalid
            }
            TaskError::Timeout(_) => UpstreamErrorKind::Timeout,
            TaskError::MissingContext(_)
            | TaskError::UnboundAgent(_)
            | TaskError::Artifact { .. } => UpstreamErrorKind::Unknown,
        }
    }
}

/// Output of one completed task.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskResult {
    pub task: TaskKind,
    pub agent: AgentRole,
    pub raw: String,
    pub research: Option<JobResearch>,
    pub artifact: Option<PathBuf>,
    pub completed_at: DateTime<Utc>,
}

/// Completed task results, in execution order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineResult {
    results: Vec<TaskResult>,
}

impl PipelineResult {
    pub fn get(&self, task: TaskKind) -> Option<&TaskResult> {
        self.results.iter().find(|r| r.task == task)
    }

    pub fn output(&self, task: TaskKind) -> Option<&str> {
        self.get(task).map(|r| r.raw.as_str())
    }

    pub fn research(&self) -> Option<&JobResearch> {
        self.get(TaskKind::Research).and_then(|r| r.research.as_ref())
    }

    pub fn completed(&self) -> Vec<TaskKind> {
        self.results.iter().map(|r| r.task).collect()
    }

    pub fn results(&self) -> &[TaskResult] {
        &self.results
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    fn push(&mut self, result: TaskResult) {
        self.results.push(result);
    }
}

#[derive(Debug, Error)]
#[error("task '{task}' failed: {error}")]
pub struct PipelineFailure {
    pub task: TaskKind,
    #[source]
    pub error: TaskError,
    pub partial: PipelineResult,
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub task_timeout: Duration,
    pub max_iterations: usize,
    /// When set, tasks with an `output_file` persist their output here.
    pub artifact_dir: Option<PathBuf>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            task_timeout: DEFAULT_TASK_TIMEOUT,
            max_iterations: crate::crew::agent::DEFAULT_MAX_ITERATIONS,
            artifact_dir: None,
        }
    }
}

/// One run's agents bound to the shared crew definition.
pub struct Pipeline {
    definition: Arc<CrewDefinition>,
    agents: Vec<Agent>,
    settings: PipelineSettings,
}

impl Pipeline {
    /// Builds fresh agents for one run. Nothing here is shared with other runs
    /// except the read-only definition and the model client.
    pub fn assemble(
        definition: Arc<CrewDefinition>,
        model: Arc<dyn LanguageModel>,
        settings: PipelineSettings,
    ) -> Self {
        let agents = definition
            .agents
            .iter()
            .map(|def| Agent::new(def.clone(), model.clone(), settings.max_iterations))
            .collect();

        Self {
            definition,
            agents,
            settings,
        }
    }

    fn agent(&self, role: AgentRole) -> Option<&Agent> {
        self.agents.iter().find(|a| a.role() == role)
    }

    pub async fn run(
        &self,
        inputs: &RunInputs,
        toolbox: &Toolbox,
    ) -> Result<PipelineResult, PipelineFailure> {
        let mut result = PipelineResult::default();

        for spec in &self.definition.tasks {
            info!(task = %spec.kind, agent = %spec.agent, "Starting task");

            match self.run_task(spec, inputs, toolbox, &result).await {
                Ok(task_result) => {
                    info!(task = %spec.kind, chars = task_result.raw.len(), "Task completed");
                    result.push(task_result);
                }
                Err(error) => {
                    warn!(task = %spec.kind, "Task failed, aborting pipeline: {error}");
                    return Err(PipelineFailure {
                        task: spec.kind,
                        error,
                        partial: result,
                    });
                }
            }
        }

        Ok(result)
    }

    async fn run_task(
        &self,
        spec: &TaskSpec,
        inputs: &RunInputs,
        toolbox: &Toolbox,
        completed: &PipelineResult,
    ) -> Result<TaskResult, TaskError> {
        let agent = self
            .agent(spec.agent)
            .ok_or(TaskError::UnboundAgent(spec.agent))?;
        let prompt = build_task_prompt(spec, inputs, completed)?;

        let raw = tokio::time::timeout(
            self.settings.task_timeout,
            agent.execute(&prompt, inputs, toolbox),
        )
        .await
        .map_err(|_| TaskError::Timeout(self.settings.task_timeout))??;

        let research = if spec.structured_output {
            Some(parse_research(&raw)?)
        } else {
            None
        };

        let artifact = match (&self.settings.artifact_dir, &spec.output_file) {
            (Some(dir), Some(file)) => Some(write_artifact(dir, file, &raw).await?),
            _ => None,
        };

        Ok(TaskResult {
            task: spec.kind,
            agent: spec.agent,
            raw,
            research,
            artifact,
            completed_at: Utc::now(),
        })
    }
}

/// Renders a task's prompt. Upstream outputs are appended in the order the
/// task declares them; a missing upstream output is an error.
fn build_task_prompt(
    spec: &TaskSpec,
    inputs: &RunInputs,
    completed: &PipelineResult,
) -> Result<String, TaskError> {
    let mut prompt = format!(
        "Current Task: {}\n\nThis is the expected criteria for your final answer: {}",
        inputs.interpolate(&spec.description),
        inputs.interpolate(&spec.expected_output)
    );

    if spec.structured_output {
        prompt.push_str("\n\n");
        prompt.push_str(RESEARCH_OUTPUT_SCHEMA);
        prompt.push_str("\n\n");
        prompt.push_str(JSON_ONLY_INSTRUCTION);
    }

    if !spec.context.is_empty() {
        prompt.push_str("\n\n");
        prompt.push_str(CONTEXT_HEADER);
        for upstream in &spec.context {
            let output = completed
                .output(*upstream)
                .ok_or(TaskError::MissingContext(*upstream))?;
            prompt.push_str(&format!("\n\n## {upstream}\n{output}"));
        }
    }

    Ok(prompt)
}

async fn write_artifact(dir: &Path, file: &str, content: &str) -> Result<PathBuf, TaskError> {
    let path = dir.join(file);
    let io = |source| TaskError::Artifact {
        path: path.clone(),
        source,
    };
    tokio::fs::create_dir_all(dir).await.map_err(io)?;
    tokio::fs::write(&path, content).await.map_err(io)?;
    info!("Wrote artifact {}", path.display());
    Ok(path)
}
