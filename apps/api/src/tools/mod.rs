//! Tool provisioning: the three capabilities agents may call.
//!
//! `Capability` is the closed set of tools; `CapabilitySet` is what a role is
//! allowed to use. A `Toolbox` is built per run, owns the request-scoped resume
//! file, and must be released by the caller once the run ends.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::errors::UpstreamErrorKind;

pub mod resume;
pub mod scrape;
pub mod search;

pub use resume::{ResumeFile, ResumeSource};

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Invalid tool input: {0}")]
    InvalidInput(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upstream returned status {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("Rate limit exceeded by {tool}: {message}")]
    RateLimited { tool: &'static str, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF extraction failed: {0}")]
    Pdf(String),
}

impl ToolError {
    pub fn kind(&self) -> UpstreamErrorKind {
        match self {
            ToolError::RateLimited { .. } => UpstreamErrorKind::RateLimited,
            ToolError::Upstream { status: 429, .. } => UpstreamErrorKind::RateLimited,
            ToolError::Http(e) if e.is_timeout() => UpstreamErrorKind::Timeout,
            ToolError::InvalidInput(_) | ToolError::Pdf(_) => UpstreamErrorKind::Invalid,
            _ => UpstreamErrorKind::Unknown,
        }
    }
}

/// A callable capability with no state beyond its construction parameters.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    async fn call(&self, input: &str) -> Result<String, ToolError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Search,
    Scrape,
    ReadResume,
}

impl Capability {
    pub const ALL: [Capability; 3] = [Capability::Search, Capability::Scrape, Capability::ReadResume];

    /// Name the model uses in `Action:` lines.
    pub fn tool_name(self) -> &'static str {
        match self {
            Capability::Search => "search_internet",
            Capability::Scrape => "scrape_website",
            Capability::ReadResume => "read_resume",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Capability::Search => {
                "Search the internet. Input: a search query. Returns titles, links and snippets."
            }
            Capability::Scrape => {
                "Read the text content of a web page. Input: a full http(s) URL."
            }
            Capability::ReadResume => {
                "Read the candidate's current resume. Input: ignored, pass an empty string."
            }
        }
    }

    pub fn from_tool_name(name: &str) -> Option<Self> {
        let name = name.trim().trim_matches(|c| c == '`' || c == '"' || c == '\'');
        Capability::ALL
            .into_iter()
            .find(|c| c.tool_name().eq_ignore_ascii_case(name))
    }

    const fn bit(self) -> u8 {
        1 << self as u8
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tool_name())
    }
}

/// The subset of capabilities bound to a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CapabilitySet(u8);

impl CapabilitySet {
    /// Search and scrape.
    pub const WEB: CapabilitySet = CapabilitySet::empty()
        .with(Capability::Search)
        .with(Capability::Scrape);

    /// Search, scrape and resume reading.
    pub const FULL: CapabilitySet = CapabilitySet::WEB.with(Capability::ReadResume);

    pub const fn empty() -> Self {
        CapabilitySet(0)
    }

    pub const fn with(self, capability: Capability) -> Self {
        CapabilitySet(self.0 | capability.bit())
    }

    pub fn contains(self, capability: Capability) -> bool {
        self.0 & capability.bit() != 0
    }

    pub fn iter(self) -> impl Iterator<Item = Capability> {
        Capability::ALL.into_iter().filter(move |c| self.contains(*c))
    }
}

/// The request-scoped set of tools shared by all agents of one run.
pub struct Toolbox {
    search: Arc<dyn Tool>,
    scrape: Arc<dyn Tool>,
    resume: ResumeFile,
}

impl Toolbox {
    /// Builds the toolbox. Inline resume content is persisted to a transient
    /// file here, before any tool can read it; failure to do so is fatal.
    pub fn provision(
        search: Arc<dyn Tool>,
        scrape: Arc<dyn Tool>,
        resume: ResumeSource,
        scratch_dir: Option<&Path>,
    ) -> Result<Self, ToolError> {
        let resume = ResumeFile::provision(resume, scratch_dir)?;
        debug!(
            search = search.name(),
            scrape = scrape.name(),
            resume = %resume.path().display(),
            "Provisioned toolbox"
        );
        Ok(Self {
            search,
            scrape,
            resume,
        })
    }

    #[cfg(test)]
    pub fn resume_path(&self) -> &Path {
        self.resume.path()
    }

    pub async fn invoke(&self, capability: Capability, input: &str) -> Result<String, ToolError> {
        debug!(tool = %capability, "Invoking tool");
        match capability {
            Capability::Search => self.search.call(input).await,
            Capability::Scrape => self.scrape.call(input).await,
            Capability::ReadResume => self.resume.read().await,
        }
    }

    /// Removes transient resources. Never fails; cleanup problems are logged.
    pub fn release(self) {
        self.resume.release();
    }
}
