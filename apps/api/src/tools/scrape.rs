//! Single-page web retrieval. HTML is reduced to readable text before it is
//! handed to the model.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use regex::Regex;
use reqwest::redirect::Policy;
use reqwest::{Client, Url};
use tracing::{debug, warn};

use super::{Capability, Tool, ToolError};

const MAX_CHARS: usize = 50_000;
const USER_AGENT: &str = "resume-tailor/0.1 (+web scrape tool)";
const MAX_REDIRECTS: usize = 5;

const BLOCKED_HOSTS: [&str; 5] = [
    "localhost",
    "0.0.0.0",
    "metadata.google.internal",
    "metadata.google",
    "metadata",
];

const BLOCKED_SUFFIXES: [&str; 4] = [".local", ".internal", ".localhost", ".lan"];

/// Compiled patterns for HTML-to-text reduction.
struct HtmlText {
    hidden: Regex,
    comments: Regex,
    breaks: Regex,
    tags: Regex,
    spaces: Regex,
}

impl HtmlText {
    fn new() -> anyhow::Result<Self> {
        Ok(Self {
            hidden: Regex::new(
                r"(?is)<script\b[^>]*>.*?</script>|<style\b[^>]*>.*?</style>|<noscript\b[^>]*>.*?</noscript>",
            )?,
            comments: Regex::new(r"(?s)<!--.*?-->")?,
            breaks: Regex::new(
                r"(?i)<br\s*/?>|</(p|div|li|ul|ol|h[1-6]|tr|section|article|header|footer)>",
            )?,
            tags: Regex::new(r"(?s)<[^>]+>")?,
            spaces: Regex::new(r"[ \t\r\x0B\x0C]+")?,
        })
    }

    fn extract(&self, html: &str) -> String {
        let text = self.hidden.replace_all(html, " ");
        let text = self.comments.replace_all(&text, " ");
        let text = self.breaks.replace_all(&text, "\n");
        let text = self.tags.replace_all(&text, " ");
        let text = decode_entities(&text);
        let text = self.spaces.replace_all(&text, " ");

        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

fn truncate_chars(text: String, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}\n[truncated]", &text[..cut]),
        None => text,
    }
}

pub struct WebScraper {
    client: Client,
    html: HtmlText,
}

impl WebScraper {
    pub fn new() -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .redirect(Policy::custom(|attempt| {
                if attempt.previous().len() >= MAX_REDIRECTS {
                    return attempt.error(ToolError::InvalidInput(format!(
                        "more than {MAX_REDIRECTS} redirects"
                    )));
                }
                match check_host(attempt.url()) {
                    Ok(()) => attempt.follow(),
                    Err(e) => attempt.error(e),
                }
            }))
            .build()
            .context("Failed to build HTTP client for scraping")?;

        Ok(Self {
            client,
            html: HtmlText::new().context("Failed to compile HTML patterns")?,
        })
    }
}

fn parse_url(input: &str) -> Result<Url, ToolError> {
    let raw = input.trim().trim_matches(|c| c == '"' || c == '\'' || c == '<' || c == '>');
    let url =
        Url::parse(raw).map_err(|e| ToolError::InvalidInput(format!("invalid URL '{raw}': {e}")))?;
    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ToolError::InvalidInput(format!(
                "unsupported URL scheme '{other}', expected http or https"
            )))
        }
    }
    check_host(&url)?;
    Ok(url)
}

/// Rejects loopback, private, link-local and metadata targets by name or
/// literal address. Applied to the initial URL and to every redirect hop.
fn check_host(url: &Url) -> Result<(), ToolError> {
    let blocked = |what: String| -> Result<(), ToolError> {
        Err(ToolError::InvalidInput(format!("access to {what} is blocked")))
    };

    match url.host() {
        None => Err(ToolError::InvalidInput(format!("URL '{url}' has no host"))),
        Some(url::Host::Ipv4(ip)) if is_private_ip(IpAddr::V4(ip)) => {
            blocked(format!("internal address '{ip}'"))
        }
        Some(url::Host::Ipv6(ip)) if is_private_ip(IpAddr::V6(ip)) => {
            blocked(format!("internal address '{ip}'"))
        }
        Some(url::Host::Domain(domain)) => {
            let domain = domain.trim_end_matches('.').to_ascii_lowercase();
            if BLOCKED_HOSTS.contains(&domain.as_str())
                || BLOCKED_SUFFIXES.iter().any(|suffix| domain.ends_with(suffix))
            {
                blocked(format!("internal host '{domain}'"))
            } else {
                Ok(())
            }
        }
        Some(_) => Ok(()),
    }
}

/// Resolves a domain host and rejects it when any address is internal.
/// Resolution failures are left for the HTTP client to report.
async fn check_resolved(url: &Url) -> Result<(), ToolError> {
    let Some(url::Host::Domain(domain)) = url.host() else {
        return Ok(());
    };
    let port = url.port_or_known_default().unwrap_or(80);
    match tokio::net::lookup_host((domain, port)).await {
        Ok(addrs) => match first_private(addrs) {
            Some(ip) => Err(ToolError::InvalidInput(format!(
                "host '{domain}' resolves to internal address '{ip}', access is blocked"
            ))),
            None => Ok(()),
        },
        Err(e) => {
            debug!("Could not resolve {domain}: {e}");
            Ok(())
        }
    }
}

fn first_private(addrs: impl IntoIterator<Item = SocketAddr>) -> Option<IpAddr> {
    addrs
        .into_iter()
        .map(|addr| addr.ip())
        .find(|ip| is_private_ip(*ip))
}

fn is_private_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            let [a, b, ..] = v4.octets();
            v4.is_private()
                || v4.is_loopback()
                || v4.is_link_local()
                || v4.is_broadcast()
                || v4.is_documentation()
                || v4.is_unspecified()
                || a == 0
                // 100.64.0.0/10, carrier-grade NAT
                || (a == 100 && (b & 0xc0) == 64)
        }
        IpAddr::V6(v6) => {
            if let Some(v4) = v6.to_ipv4_mapped() {
                return is_private_ip(IpAddr::V4(v4));
            }
            let first = v6.segments()[0];
            v6.is_loopback()
                || v6.is_unspecified()
                // fc00::/7 unique local
                || (first & 0xfe00) == 0xfc00
                // fe80::/10 link local
                || (first & 0xffc0) == 0xfe80
        }
    }
}

/// Surfaces a blocked redirect hop as the same input error a blocked URL gets.
fn send_error(e: reqwest::Error) -> ToolError {
    if e.is_redirect() {
        let blocked = std::error::Error::source(&e)
            .and_then(|source| source.downcast_ref::<ToolError>())
            .and_then(|source| match source {
                ToolError::InvalidInput(message) => Some(message.clone()),
                _ => None,
            });
        if let Some(message) = blocked {
            warn!("Blocked redirect: {message}");
            return ToolError::InvalidInput(message);
        }
    }
    ToolError::from(e)
}

#[async_trait]
impl Tool for WebScraper {
    fn name(&self) -> &str {
        Capability::Scrape.tool_name()
    }

    async fn call(&self, input: &str) -> Result<String, ToolError> {
        let url = parse_url(input)?;
        check_resolved(&url).await?;
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(send_error)?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(ToolError::RateLimited {
                tool: Capability::Scrape.tool_name(),
                message: format!("{url} answered 429 Too Many Requests"),
            });
        }
        if !status.is_success() {
            return Err(ToolError::Upstream {
                status: status.as_u16(),
                message: format!("failed to fetch {url}"),
            });
        }

        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("text/html"));
        let body = response.text().await?;

        let content = if is_html {
            self.html.extract(&body)
        } else {
            body
        };
        debug!("Scraped {} ({} chars)", url, content.len());

        Ok(truncate_chars(content, MAX_CHARS))
    }
}
