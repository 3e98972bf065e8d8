use std::fmt;

use serde::{Deserialize, Serialize};

use crate::tools::CapabilitySet;

/// Default request ceiling per role, in model calls per minute.
pub const DEFAULT_MAX_RPM: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentRole {
    #[serde(rename = "researcher")]
    Researcher,
    #[serde(rename = "profiler")]
    Profiler,
    #[serde(rename = "resume_strategist")]
    Strategist,
    #[serde(rename = "interview_preparer")]
    InterviewPreparer,
}

impl AgentRole {
    pub const ALL: [AgentRole; 4] = [
        AgentRole::Researcher,
        AgentRole::Profiler,
        AgentRole::Strategist,
        AgentRole::InterviewPreparer,
    ];

    pub fn key(self) -> &'static str {
        match self {
            AgentRole::Researcher => "researcher",
            AgentRole::Profiler => "profiler",
            AgentRole::Strategist => "resume_strategist",
            AgentRole::InterviewPreparer => "interview_preparer",
        }
    }

    /// Tools each role may call. The researcher never sees the resume.
    pub fn capabilities(self) -> CapabilitySet {
        match self {
            AgentRole::Researcher => CapabilitySet::WEB,
            AgentRole::Profiler | AgentRole::Strategist | AgentRole::InterviewPreparer => {
                CapabilitySet::FULL
            }
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

fn default_max_rpm() -> u32 {
    DEFAULT_MAX_RPM
}

/// Declarative definition of one agent: who it is and how often it may call the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDefinition {
    pub role: AgentRole,
    /// Human-readable role title, e.g. "Tech Job Researcher".
    pub title: String,
    pub goal: String,
    pub backstory: String,
    #[serde(default = "default_max_rpm")]
    pub max_rpm: u32,
}
