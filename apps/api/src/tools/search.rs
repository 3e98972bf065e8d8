//! Web search via the Serper.dev Google Search API.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Capability, Tool, ToolError};

const SERPER_SEARCH_URL: &str = "https://google.serper.dev/search";
const MAX_RESULTS: usize = 5;

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    q: &'a str,
    num: usize,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    organic: Vec<OrganicResult>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    title: String,
    link: String,
    #[serde(default)]
    snippet: Option<String>,
}

pub struct SerperSearch {
    client: Client,
    api_key: String,
}

impl SerperSearch {
    pub fn new(api_key: String) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client for search")?;
        Ok(Self { client, api_key })
    }
}

#[async_trait]
impl Tool for SerperSearch {
    fn name(&self) -> &str {
        Capability::Search.tool_name()
    }

    async fn call(&self, input: &str) -> Result<String, ToolError> {
        let query = input.trim();
        if query.is_empty() {
            return Err(ToolError::InvalidInput("search query is empty".to_string()));
        }

        let response = self
            .client
            .post(SERPER_SEARCH_URL)
            .header("X-API-KEY", &self.api_key)
            .json(&SearchRequest {
                q: query,
                num: MAX_RESULTS,
            })
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 429 {
            let message = response.text().await.unwrap_or_default();
            return Err(ToolError::RateLimited {
                tool: Capability::Search.tool_name(),
                message,
            });
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ToolError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let body: SearchResponse = response.json().await?;
        debug!("Search '{}' returned {} results", query, body.organic.len());
        Ok(format_results(query, &body.organic))
    }
}

fn format_results(query: &str, results: &[OrganicResult]) -> String {
    if results.is_empty() {
        return format!("No results found for '{query}'.");
    }

    results
        .iter()
        .take(MAX_RESULTS)
        .map(|r| {
            format!(
                "Title: {}\nLink: {}\nSnippet: {}",
                r.title,
                r.link,
                r.snippet.as_deref().unwrap_or("")
            )
        })
        .collect::<Vec<_>>()
        .join("\n---\n")
}
