//! Declarative crew definition: the four agents and four tasks of a run.
//!
//! Loaded once at startup (built-in defaults, or a JSON override file) and
//! shared read-only across requests. `validate()` is the startup gate: a
//! malformed definition is a configuration error, not a per-request failure.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{bail, ensure, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::crew::prompts::*;
use crate::crew::roles::{AgentDefinition, AgentRole, DEFAULT_MAX_RPM};
use crate::crew::tasks::{TaskKind, TaskSpec};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrewDefinition {
    pub agents: Vec<AgentDefinition>,
    pub tasks: Vec<TaskSpec>,
}

impl CrewDefinition {
    pub fn builtin() -> Self {
        let agent = |role, title: &str, goal: &str, backstory: &str| AgentDefinition {
            role,
            title: title.to_string(),
            goal: goal.to_string(),
            backstory: backstory.to_string(),
            max_rpm: DEFAULT_MAX_RPM,
        };

        Self {
            agents: vec![
                agent(
                    AgentRole::Researcher,
                    RESEARCHER_TITLE,
                    RESEARCHER_GOAL,
                    RESEARCHER_BACKSTORY,
                ),
                agent(
                    AgentRole::Profiler,
                    PROFILER_TITLE,
                    PROFILER_GOAL,
                    PROFILER_BACKSTORY,
                ),
                agent(
                    AgentRole::Strategist,
                    STRATEGIST_TITLE,
                    STRATEGIST_GOAL,
                    STRATEGIST_BACKSTORY,
                ),
                agent(
                    AgentRole::InterviewPreparer,
                    INTERVIEW_PREPARER_TITLE,
                    INTERVIEW_PREPARER_GOAL,
                    INTERVIEW_PREPARER_BACKSTORY,
                ),
            ],
            tasks: vec![
                TaskSpec {
                    kind: TaskKind::Research,
                    agent: AgentRole::Researcher,
                    description: RESEARCH_DESCRIPTION.to_string(),
                    expected_output: RESEARCH_EXPECTED_OUTPUT.to_string(),
                    structured_output: true,
                    context: vec![],
                    output_file: None,
                },
                TaskSpec {
                    kind: TaskKind::Profile,
                    agent: AgentRole::Profiler,
                    description: PROFILE_DESCRIPTION.to_string(),
                    expected_output: PROFILE_EXPECTED_OUTPUT.to_string(),
                    structured_output: false,
                    context: vec![],
                    output_file: None,
                },
                TaskSpec {
                    kind: TaskKind::Strategize,
                    agent: AgentRole::Strategist,
                    description: STRATEGY_DESCRIPTION.to_string(),
                    expected_output: STRATEGY_EXPECTED_OUTPUT.to_string(),
                    structured_output: false,
                    context: vec![TaskKind::Research, TaskKind::Profile],
                    output_file: Some(TAILORED_RESUME_FILE.to_string()),
                },
                TaskSpec {
                    kind: TaskKind::PrepareInterview,
                    agent: AgentRole::InterviewPreparer,
                    description: INTERVIEW_DESCRIPTION.to_string(),
                    expected_output: INTERVIEW_EXPECTED_OUTPUT.to_string(),
                    structured_output: false,
                    context: vec![TaskKind::Research, TaskKind::Profile, TaskKind::Strategize],
                    output_file: Some(INTERVIEW_MATERIALS_FILE.to_string()),
                },
            ],
        }
    }

    /// Loads the override file if given, else the built-in crew. Always validated.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let definition = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).with_context(|| {
                    format!("Failed to read crew definitions from {}", path.display())
                })?;
                let definition: CrewDefinition = serde_json::from_str(&raw).with_context(|| {
                    format!("Malformed crew definitions in {}", path.display())
                })?;
                info!("Loaded crew definitions from {}", path.display());
                definition
            }
            None => Self::builtin(),
        };

        definition.validate()?;
        Ok(definition)
    }

    #[cfg(test)]
    pub fn agent(&self, role: AgentRole) -> Option<&AgentDefinition> {
        self.agents.iter().find(|a| a.role == role)
    }

    pub fn task(&self, kind: TaskKind) -> Option<&TaskSpec> {
        self.tasks.iter().find(|t| t.kind == kind)
    }

    /// Checks every structural invariant the pipeline relies on.
    pub fn validate(&self) -> Result<()> {
        let mut seen_roles = HashSet::new();
        for agent in &self.agents {
            ensure!(
                seen_roles.insert(agent.role),
                "agent '{}' is defined more than once",
                agent.role
            );
            ensure!(
                !agent.goal.trim().is_empty() && !agent.backstory.trim().is_empty(),
                "agent '{}' needs a goal and a backstory",
                agent.role
            );
        }
        for role in AgentRole::ALL {
            ensure!(seen_roles.contains(&role), "agent '{role}' is not defined");
        }

        let kinds: Vec<TaskKind> = self.tasks.iter().map(|t| t.kind).collect();
        ensure!(
            kinds == TaskKind::ORDER,
            "tasks must be declared exactly in the order {:?}, got {:?}",
            TaskKind::ORDER.map(TaskKind::name),
            kinds.iter().map(|k| k.name()).collect::<Vec<_>>()
        );

        for (position, task) in self.tasks.iter().enumerate() {
            ensure!(
                task.agent == task.kind.role(),
                "task '{}' must be bound to agent '{}', not '{}'",
                task.kind,
                task.kind.role(),
                task.agent
            );
            ensure!(
                !task.description.trim().is_empty() && !task.expected_output.trim().is_empty(),
                "task '{}' needs a description and an expected output",
                task.kind
            );

            let mut seen_context = HashSet::new();
            for upstream in &task.context {
                if upstream.position() >= position {
                    bail!(
                        "task '{}' lists '{}' as context, but it does not run earlier",
                        task.kind,
                        upstream
                    );
                }
                ensure!(
                    seen_context.insert(*upstream),
                    "task '{}' lists context '{}' twice",
                    task.kind,
                    upstream
                );
            }
        }

        let research = self
            .task(TaskKind::Research)
            .context("research task is not defined")?;
        ensure!(
            research.structured_output,
            "research task must produce structured output"
        );

        Ok(())
    }
}
