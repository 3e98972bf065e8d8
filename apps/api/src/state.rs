use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::config::Config;
use crate::crew::{CrewDefinition, PipelineSettings};
use crate::llm_client::{GeminiClient, LanguageModel};
use crate::tools::scrape::WebScraper;
use crate::tools::search::SerperSearch;
use crate::tools::Tool;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// Everything here is read-only after startup. Per-request state (agents,
/// toolbox, transient resume file) is built by `tailoring::service`.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub crew: Arc<CrewDefinition>,
    pub llm: Arc<dyn LanguageModel>,
    pub search: Arc<dyn Tool>,
    pub scrape: Arc<dyn Tool>,
}

impl AppState {
    pub fn from_config(config: Config) -> Result<Self> {
        let crew = CrewDefinition::load(config.crew_definitions_path.as_deref())?;
        let llm = GeminiClient::new(
            config.gemini_api_key.clone(),
            config.llm_model.clone(),
            config.llm_temperature,
        )?;
        let search = SerperSearch::new(config.serper_api_key.clone())?;
        let scrape = WebScraper::new()?;

        Ok(Self {
            config,
            crew: Arc::new(crew),
            llm: Arc::new(llm),
            search: Arc::new(search),
            scrape: Arc::new(scrape),
        })
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            task_timeout: Duration::from_secs(self.config.task_timeout_secs),
            max_iterations: self.config.agent_max_iterations,
            artifact_dir: self.config.artifact_dir.clone(),
        }
    }
}
