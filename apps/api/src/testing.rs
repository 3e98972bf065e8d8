//! Test doubles shared by the unit tests: scripted models, stub tools and
//! ready-made inputs.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use crate::config::Config;
use crate::crew::{CrewDefinition, RunInputs};
use crate::llm_client::{LanguageModel, LlmError};
use crate::state::AppState;
use crate::tools::{ResumeSource, Tool, ToolError, Toolbox};

type ErrorFactory = Box<dyn Fn() -> LlmError + Send + Sync>;

/// Replies with canned responses in order and records every prompt it sees.
pub struct ScriptedModel {
    replies: Mutex<VecDeque<String>>,
    error: Option<ErrorFactory>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new<I>(replies: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            error: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// A model whose every call fails with a fresh error from `make_error`.
    pub fn failing<F>(make_error: F) -> Self
    where
        F: Fn() -> LlmError + Send + Sync + 'static,
    {
        Self {
            replies: Mutex::new(VecDeque::new()),
            error: Some(Box::new(make_error)),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    fn model_id(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, _system: &str, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(make_error) = &self.error {
            return Err(make_error());
        }
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| LlmError::Api {
                status: 500,
                message: "script exhausted".to_string(),
            })
    }
}

/// Never answers.
pub struct HangingModel;

#[async_trait]
impl LanguageModel for HangingModel {
    fn model_id(&self) -> &str {
        "hanging"
    }

    async fn complete(&self, _system: &str, _prompt: &str) -> Result<String, LlmError> {
        std::future::pending().await
    }
}

enum StubBehavior {
    Ok(String),
    Fail(String),
    RateLimited,
}

pub struct StubTool {
    name: &'static str,
    behavior: StubBehavior,
}

impl StubTool {
    pub fn ok(name: &'static str, output: &str) -> Self {
        Self {
            name,
            behavior: StubBehavior::Ok(output.to_string()),
        }
    }

    pub fn failing(name: &'static str, message: &str) -> Self {
        Self {
            name,
            behavior: StubBehavior::Fail(message.to_string()),
        }
    }

    pub fn rate_limited(name: &'static str) -> Self {
        Self {
            name,
            behavior: StubBehavior::RateLimited,
        }
    }
}

#[async_trait]
impl Tool for StubTool {
    fn name(&self) -> &str {
        self.name
    }

    async fn call(&self, _input: &str) -> Result<String, ToolError> {
        match &self.behavior {
            StubBehavior::Ok(output) => Ok(output.clone()),
            StubBehavior::Fail(message) => Err(ToolError::Upstream {
                status: 502,
                message: message.clone(),
            }),
            StubBehavior::RateLimited => Err(ToolError::RateLimited {
                tool: self.name,
                message: "quota exceeded".to_string(),
            }),
        }
    }
}

pub fn run_inputs() -> RunInputs {
    RunInputs {
        job_posting_url: "https://example.com/job/123".to_string(),
        github_url: "https://github.com/alice".to_string(),
        personal_writeup: "Alice is a backend engineer...".to_string(),
        resume: ResumeSource::Inline("# Alice Resume\n...".to_string()),
    }
}

pub fn toolbox(scratch_dir: &Path) -> Toolbox {
    toolbox_with(
        scratch_dir,
        StubTool::ok("search_internet", "search results"),
        StubTool::ok("scrape_website", "<html>job page</html>"),
    )
}

pub fn toolbox_with(scratch_dir: &Path, search: StubTool, scrape: StubTool) -> Toolbox {
    Toolbox::provision(
        Arc::new(search),
        Arc::new(scrape),
        run_inputs().resume,
        Some(scratch_dir),
    )
    .unwrap()
}

/// A researcher final answer carrying a valid structured result.
pub fn research_json(job_title: &str, company: &str) -> String {
    let research = json!({
        "job_title": job_title,
        "company": company,
        "requirements": {
            "skills": ["Rust", "PostgreSQL"],
            "qualifications": ["BSc Computer Science"],
            "experience": ["5+ years backend"]
        },
        "summary": "Build and run backend services."
    });
    format!("Final Answer: {research}")
}

/// One reply per task for a clean run of the built-in crew.
pub fn happy_script() -> Vec<String> {
    vec![
        research_json("Senior Backend Engineer", "Acme"),
        "Final Answer: PROFILE: Alice builds backends.".to_string(),
        "Final Answer: # Tailored Resume\nAlice".to_string(),
        "Final Answer: # Interview Prep\nQ1".to_string(),
    ]
}

pub fn test_config(scratch_dir: &Path) -> Config {
    Config {
        gemini_api_key: "test-gemini-key".to_string(),
        serper_api_key: "test-serper-key".to_string(),
        llm_model: "gemini-1.5-pro-latest".to_string(),
        llm_temperature: 0.7,
        port: 0,
        rust_log: "debug".to_string(),
        task_timeout_secs: 30,
        agent_max_iterations: 4,
        artifact_dir: None,
        resume_scratch_dir: Some(scratch_dir.to_path_buf()),
        crew_definitions_path: None,
    }
}

/// Application state wired to `model` and stub tools.
pub fn test_state(model: Arc<dyn LanguageModel>, scratch_dir: &Path) -> AppState {
    AppState {
        config: test_config(scratch_dir),
        crew: Arc::new(CrewDefinition::builtin()),
        llm: model,
        search: Arc::new(StubTool::ok("search_internet", "search results")),
        scrape: Arc::new(StubTool::ok("scrape_website", "<html>job page</html>")),
    }
}
