//! Agent executor: a role bound to a model and its capability set.
//!
//! An agent answers a task prompt in a bounded loop: each model reply either
//! names a tool (`Action:` / `Action Input:`), whose observation is appended
//! to the transcript, or ends the task (`Final Answer:`). A reply with neither
//! marker is taken as the final answer.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::crew::pipeline::TaskError;
use crate::crew::roles::{AgentDefinition, AgentRole};
use crate::crew::tasks::RunInputs;
use crate::errors::UpstreamErrorKind;
use crate::llm_client::prompts::{
    ACTION_INPUT_MARKER, ACTION_MARKER, FINAL_ANSWER_MARKER, TOOL_USE_FORMAT,
};
use crate::llm_client::rate_limit::RateLimitedModel;
use crate::llm_client::LanguageModel;
use crate::tools::{Capability, CapabilitySet, Toolbox};

pub const DEFAULT_MAX_ITERATIONS: usize = 8;

const OBSERVATION_MARKER: &str = "Observation:";

#[derive(Debug, PartialEq)]
enum AgentStep {
    UseTool { tool: String, input: String },
    Finish(String),
}

pub struct Agent {
    definition: AgentDefinition,
    model: Arc<dyn LanguageModel>,
    capabilities: CapabilitySet,
    max_iterations: usize,
}

impl Agent {
    /// Binds a definition to a model. The model is wrapped in the role's request ceiling.
    pub fn new(
        definition: AgentDefinition,
        model: Arc<dyn LanguageModel>,
        max_iterations: usize,
    ) -> Self {
        let capabilities = definition.role.capabilities();
        let model: Arc<dyn LanguageModel> =
            Arc::new(RateLimitedModel::new(model, definition.max_rpm));
        Self {
            definition,
            model,
            capabilities,
            max_iterations: max_iterations.max(1),
        }
    }

    pub fn role(&self) -> AgentRole {
        self.definition.role
    }

    fn system_prompt(&self, inputs: &RunInputs) -> String {
        let tool_list = self
            .capabilities
            .iter()
            .map(|c| format!("- {}: {}", c.tool_name(), c.description()))
            .collect::<Vec<_>>()
            .join("\n");
        let tool_names = self
            .capabilities
            .iter()
            .map(Capability::tool_name)
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "You are {}. {}\nYour personal goal is: {}\n\n{}",
            self.definition.title,
            inputs.interpolate(&self.definition.backstory),
            inputs.interpolate(&self.definition.goal),
            TOOL_USE_FORMAT
                .replace("{tool_list}", &tool_list)
                .replace("{tool_names}", &tool_names)
        )
    }

    /// Runs the tool-use loop until the model produces a final answer.
    pub async fn execute(
        &self,
        task_prompt: &str,
        inputs: &RunInputs,
        toolbox: &Toolbox,
    ) -> Result<String, TaskError> {
        let system = self.system_prompt(inputs);
        let mut transcript = task_prompt.to_string();

        for iteration in 1..=self.max_iterations {
            let reply = self.model.complete(&system, &transcript).await?;

            match parse_step(&reply) {
                AgentStep::Finish(answer) => {
                    if answer.is_empty() {
                        return Err(TaskError::InvalidOutput(format!(
                            "agent '{}' returned an empty answer",
                            self.role()
                        )));
                    }
                    info!(
                        agent = %self.role(),
                        iterations = iteration,
                        "Agent produced final answer"
                    );
                    return Ok(answer);
                }
                AgentStep::UseTool { tool, input } => {
                    debug!(agent = %self.role(), %tool, iteration, "Agent requested tool");
                    let observation = self.observe(&tool, &input, toolbox).await?;
                    transcript.push_str(&format!(
                        "\n\n{ACTION_MARKER} {tool}\n{ACTION_INPUT_MARKER} {input}\n{OBSERVATION_MARKER} {observation}"
                    ));
                }
            }
        }

        Err(TaskError::IterationLimit(self.max_iterations))
    }

    /// Runs a tool on the agent's behalf. Only rate-limit failures abort the task;
    /// other tool failures are reported back to the model.
    async fn observe(&self, tool: &str, input: &str, toolbox: &Toolbox) -> Result<String, TaskError> {
        let capability = match Capability::from_tool_name(tool) {
            Some(c) if self.capabilities.contains(c) => c,
            _ => {
                warn!(agent = %self.role(), %tool, "Agent asked for a tool it does not have");
                let available = self
                    .capabilities
                    .iter()
                    .map(Capability::tool_name)
                    .collect::<Vec<_>>()
                    .join(", ");
                return Ok(format!(
                    "Tool '{tool}' is not available. Available tools: {available}"
                ));
            }
        };

        match toolbox.invoke(capability, input).await {
            Ok(output) => Ok(output),
            Err(e) if e.kind() == UpstreamErrorKind::RateLimited => Err(TaskError::Tool(e)),
            Err(e) => {
                warn!(agent = %self.role(), tool = %capability, "Tool failed: {e}");
                Ok(format!("Tool error: {e}"))
            }
        }
    }
}

fn parse_step(reply: &str) -> AgentStep {
    if let Some(idx) = reply.find(FINAL_ANSWER_MARKER) {
        return AgentStep::Finish(reply[idx + FINAL_ANSWER_MARKER.len()..].trim().to_string());
    }

    let mut tool: Option<&str> = None;
    let mut offset = 0;
    for line in reply.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if trimmed.starts_with(ACTION_INPUT_MARKER) {
            if let Some(tool) = tool {
                let start = offset + (line.len() - trimmed.len()) + ACTION_INPUT_MARKER.len();
                let rest = &reply[start..];
                // The model sometimes writes its own observation; drop it.
                let rest = rest.split(OBSERVATION_MARKER).next().unwrap_or(rest);
                return AgentStep::UseTool {
                    tool: tool.to_string(),
                    input: normalize_input(rest),
                };
            }
            break;
        }
        if let Some(rest) = trimmed.strip_prefix(ACTION_MARKER) {
            tool = Some(rest.trim());
        }
        offset += line.len();
    }

    match tool {
        Some(tool) => AgentStep::UseTool {
            tool: tool.to_string(),
            input: String::new(),
        },
        None => AgentStep::Finish(reply.trim().to_string()),
    }
}

/// Accepts plain text, a quoted string, or a JSON object such as `{"url": "..."}`.
fn normalize_input(raw: &str) -> String {
    let raw = raw.trim();
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(raw) {
        if let Some(value) = map.values().find_map(|v| v.as_str()) {
            return value.trim().to_string();
        }
    }
    raw.trim_matches('"').trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crew::definitions::CrewDefinition;
    use crate::llm_client::LlmError;
    use crate::testing::{run_inputs, toolbox, ScriptedModel, StubTool};

    fn agent(role: AgentRole, model: Arc<ScriptedModel>, max_iterations: usize) -> Agent {
        let definition = CrewDefinition::builtin().agent(role).unwrap().clone();
        Agent::new(definition, model, max_iterations)
    }

    #[test]
    fn test_parse_final_answer() {
        assert_eq!(
            parse_step("Thought: I know it.\nFinal Answer: The answer\nspans lines"),
            AgentStep::Finish("The answer\nspans lines".to_string())
        );
    }

    #[test]
    fn test_parse_action() {
        assert_eq!(
            parse_step("Thought: look it up\nAction: scrape_website\nAction Input: https://example.com/job/123"),
            AgentStep::UseTool {
                tool: "scrape_website".to_string(),
                input: "https://example.com/job/123".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_action_with_json_input_and_fake_observation() {
        let reply = "Action: search_internet\nAction Input: {\"search_query\": \"Acme Corp\"}\nObservation: made up";
        assert_eq!(
            parse_step(reply),
            AgentStep::UseTool {
                tool: "search_internet".to_string(),
                input: "Acme Corp".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_plain_text_is_final() {
        assert_eq!(
            parse_step("  Just an answer.  "),
            AgentStep::Finish("Just an answer.".to_string())
        );
    }

    #[test]
    fn test_system_prompt_lists_only_role_tools() {
        let researcher = agent(AgentRole::Researcher, Arc::new(ScriptedModel::new(["x"])), 3);
        let prompt = researcher.system_prompt(&run_inputs());
        assert!(prompt.contains("search_internet"));
        assert!(prompt.contains("scrape_website"));
        assert!(!prompt.contains("read_resume"));
        assert!(prompt.contains("https://example.com/job/123"));
    }

    #[tokio::test]
    async fn test_direct_final_answer() {
        let dir = tempfile::tempdir().unwrap();
        let tools = toolbox(dir.path());
        let model = Arc::new(ScriptedModel::new(["Final Answer: profile text"]));
        let profiler = agent(AgentRole::Profiler, model.clone(), 3);

        let answer = profiler.execute("task", &run_inputs(), &tools).await.unwrap();
        assert_eq!(answer, "profile text");
        assert_eq!(model.prompts().len(), 1);
        tools.release();
    }

    #[tokio::test]
    async fn test_tool_observation_is_fed_back() {
        let dir = tempfile::tempdir().unwrap();
        let tools = toolbox(dir.path());
        let model = Arc::new(ScriptedModel::new([
            "Action: scrape_website\nAction Input: https://example.com/job/123",
            "Final Answer: done",
        ]));
        let researcher = agent(AgentRole::Researcher, model.clone(), 3);

        let answer = researcher.execute("task", &run_inputs(), &tools).await.unwrap();
        assert_eq!(answer, "done");
        let prompts = model.prompts();
        assert!(prompts[1].contains("Observation: <html>job page</html>"));
        tools.release();
    }

    #[tokio::test]
    async fn test_researcher_cannot_read_resume() {
        let dir = tempfile::tempdir().unwrap();
        let tools = toolbox(dir.path());
        let model = Arc::new(ScriptedModel::new([
            "Action: read_resume\nAction Input: ",
            "Final Answer: done",
        ]));
        let researcher = agent(AgentRole::Researcher, model.clone(), 3);

        researcher.execute("task", &run_inputs(), &tools).await.unwrap();
        let prompts = model.prompts();
        assert!(prompts[1].contains("Tool 'read_resume' is not available"));
        assert!(!prompts[1].contains("Alice Resume"));
        tools.release();
    }

    #[tokio::test]
    async fn test_strategist_can_read_resume() {
        let dir = tempfile::tempdir().unwrap();
        let tools = toolbox(dir.path());
        let model = Arc::new(ScriptedModel::new([
            "Action: read_resume\nAction Input: \"\"",
            "Final Answer: tailored",
        ]));
        let strategist = agent(AgentRole::Strategist, model.clone(), 3);

        strategist.execute("task", &run_inputs(), &tools).await.unwrap();
        assert!(model.prompts()[1].contains("# Alice Resume"));
        tools.release();
    }

    #[tokio::test]
    async fn test_tool_error_becomes_observation() {
        let dir = tempfile::tempdir().unwrap();
        let tools = crate::testing::toolbox_with(
            dir.path(),
            StubTool::failing("search_internet", "connection reset"),
            StubTool::ok("scrape_website", "page"),
        );
        let model = Arc::new(ScriptedModel::new([
            "Action: search_internet\nAction Input: acme",
            "Final Answer: done anyway",
        ]));
        let profiler = agent(AgentRole::Profiler, model.clone(), 3);

        let answer = profiler.execute("task", &run_inputs(), &tools).await.unwrap();
        assert_eq!(answer, "done anyway");
        assert!(model.prompts()[1].contains("Tool error"));
        tools.release();
    }

    #[tokio::test]
    async fn test_rate_limited_tool_fails_task() {
        let dir = tempfile::tempdir().unwrap();
        let tools = crate::testing::toolbox_with(
            dir.path(),
            StubTool::rate_limited("search_internet"),
            StubTool::ok("scrape_website", "page"),
        );
        let model = Arc::new(ScriptedModel::new([
            "Action: search_internet\nAction Input: acme",
            "Final Answer: unreachable",
        ]));
        let profiler = agent(AgentRole::Profiler, model, 3);

        let err = profiler.execute("task", &run_inputs(), &tools).await.unwrap_err();
        assert_eq!(err.kind(), UpstreamErrorKind::RateLimited);
        tools.release();
    }

    #[tokio::test]
    async fn test_iteration_limit() {
        let dir = tempfile::tempdir().unwrap();
        let tools = toolbox(dir.path());
        let model = Arc::new(ScriptedModel::new([
            "Action: search_internet\nAction Input: a",
            "Action: search_internet\nAction Input: b",
            "Action: search_internet\nAction Input: c",
        ]));
        let profiler = agent(AgentRole::Profiler, model, 2);

        let err = profiler.execute("task", &run_inputs(), &tools).await.unwrap_err();
        assert!(matches!(err, TaskError::IterationLimit(2)));
        tools.release();
    }

    #[tokio::test]
    async fn test_model_error_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let tools = toolbox(dir.path());
        let model = Arc::new(ScriptedModel::failing(|| LlmError::Timeout));
        let profiler = agent(AgentRole::Profiler, model, 2);

        let err = profiler.execute("task", &run_inputs(), &tools).await.unwrap_err();
        assert!(matches!(err, TaskError::Model(LlmError::Timeout)));
        tools.release();
    }
}
