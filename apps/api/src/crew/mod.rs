// The tailoring crew: four agents, four tasks, one fixed sequential pipeline.
// All model calls go through llm_client; all tool calls go through tools::Toolbox.

pub mod agent;
pub mod definitions;
pub mod pipeline;
pub mod prompts;
pub mod research;
pub mod roles;
pub mod tasks;

pub use definitions::CrewDefinition;
pub use pipeline::{Pipeline, PipelineFailure, PipelineResult, PipelineSettings};
pub use tasks::{RunInputs, TaskKind};
