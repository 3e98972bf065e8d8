use std::fmt;

use serde::{Deserialize, Serialize};

use crate::crew::roles::AgentRole;
use crate::tools::ResumeSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    #[serde(rename = "research_task")]
    Research,
    #[serde(rename = "profile_task")]
    Profile,
    #[serde(rename = "resume_strategy_task")]
    Strategize,
    #[serde(rename = "interview_preparation_task")]
    PrepareInterview,
}

impl TaskKind {
    /// Execution order. Fixed.
    pub const ORDER: [TaskKind; 4] = [
        TaskKind::Research,
        TaskKind::Profile,
        TaskKind::Strategize,
        TaskKind::PrepareInterview,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TaskKind::Research => "research_task",
            TaskKind::Profile => "profile_task",
            TaskKind::Strategize => "resume_strategy_task",
            TaskKind::PrepareInterview => "interview_preparation_task",
        }
    }

    /// The agent each task is bound to (1:1).
    pub fn role(self) -> AgentRole {
        match self {
            TaskKind::Research => AgentRole::Researcher,
            TaskKind::Profile => AgentRole::Profiler,
            TaskKind::Strategize => AgentRole::Strategist,
            TaskKind::PrepareInterview => AgentRole::InterviewPreparer,
        }
    }

    pub fn position(self) -> usize {
        self as usize
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One pipeline stage, as declared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub kind: TaskKind,
    pub agent: AgentRole,
    /// Template; see `RunInputs::interpolate` for placeholders.
    pub description: String,
    pub expected_output: String,
    /// When set, the final answer must parse as `JobResearch`.
    #[serde(default)]
    pub structured_output: bool,
    /// Upstream tasks whose outputs are injected, in this order.
    #[serde(default)]
    pub context: Vec<TaskKind>,
    /// Artifact file name, relative to the artifact directory.
    #[serde(default)]
    pub output_file: Option<String>,
}

/// Inputs of one pipeline run. Immutable once built.
#[derive(Debug, Clone)]
pub struct RunInputs {
    pub job_posting_url: String,
    pub github_url: String,
    pub personal_writeup: String,
    pub resume: ResumeSource,
}

impl RunInputs {
    /// Fills `{job_posting_url}`, `{github_url}` and `{personal_writeup}`.
    /// Unknown placeholders are left untouched.
    /// Substituted values are never rescanned.
    pub fn interpolate(&self, template: &str) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let token = &rest[open..];
            let Some(close) = token.find('}') else {
                rest = token;
                break;
            };
            let name = &token[1..close];
            if name.contains('{') {
                out.push('{');
                rest = &token[1..];
                continue;
            }
            match self.placeholder(name) {
                Some(value) => out.push_str(value),
                None => out.push_str(&token[..=close]),
            }
            rest = &token[close + 1..];
        }

        out.push_str(rest);
        out
    }

    fn placeholder(&self, name: &str) -> Option<&str> {
        match name {
            "job_posting_url" => Some(&self.job_posting_url),
            "github_url" => Some(&self.github_url),
            "personal_writeup" => Some(&self.personal_writeup),
            _ => None,
        }
    }
}
