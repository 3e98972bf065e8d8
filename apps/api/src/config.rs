use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::llm_client::{DEFAULT_MODEL, DEFAULT_TEMPERATURE};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub serper_api_key: String,
    pub llm_model: String,
    pub llm_temperature: f32,
    pub port: u16,
    pub rust_log: String,
    pub task_timeout_secs: u64,
    pub agent_max_iterations: usize,
    /// Unset: results stay in memory only.
    pub artifact_dir: Option<PathBuf>,
    /// Where inline resumes are staged. Unset: the OS temp dir.
    pub resume_scratch_dir: Option<PathBuf>,
    pub crew_definitions_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            serper_api_key: require_env("SERPER_API_KEY")?,
            llm_model: std::env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            llm_temperature: parse_or(
                "LLM_TEMPERATURE",
                optional_env("LLM_TEMPERATURE"),
                DEFAULT_TEMPERATURE,
            )?,
            port: parse_or("PORT", optional_env("PORT"), 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            task_timeout_secs: parse_or(
                "TASK_TIMEOUT_SECS",
                optional_env("TASK_TIMEOUT_SECS"),
                300,
            )?,
            agent_max_iterations: parse_or(
                "AGENT_MAX_ITERATIONS",
                optional_env("AGENT_MAX_ITERATIONS"),
                crate::crew::agent::DEFAULT_MAX_ITERATIONS,
            )?,
            artifact_dir: optional_env("ARTIFACT_DIR").map(PathBuf::from),
            resume_scratch_dir: optional_env("RESUME_SCRATCH_DIR").map(PathBuf::from),
            crew_definitions_path: optional_env("CREW_DEFINITIONS_PATH").map(PathBuf::from),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Unset and blank values both count as absent.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(value) => value
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{value}'")),
        None => Ok(default),
    }
}
