// Shared prompt fragments used by every agent.
// Role- and task-specific text lives in crew::prompts.

/// Marker the model uses to name a tool.
pub const ACTION_MARKER: &str = "Action:";

/// Marker the model uses for the tool argument.
pub const ACTION_INPUT_MARKER: &str = "Action Input:";

/// Marker the model uses to end its turn with the task output.
pub const FINAL_ANSWER_MARKER: &str = "Final Answer:";

/// Reply-format instructions appended to every agent system prompt.
/// Replace `{tool_list}` and `{tool_names}` before sending.
pub const TOOL_USE_FORMAT: &str = r#"You have access to the following tools:

{tool_list}

To use a tool, reply with exactly these two lines and nothing else:
Action: the tool to use, one of [{tool_names}]
Action Input: the input for the tool

The tool result will be returned to you as an "Observation:". You may use
tools several times. When you have everything you need, reply with:
Final Answer: your complete answer to the task

Never invent an Observation yourself."#;

/// Instruction appended to task prompts whose output must be JSON.
pub const JSON_ONLY_INSTRUCTION: &str = "Your Final Answer MUST be valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";
