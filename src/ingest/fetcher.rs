// src/ingest/fetcher.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

use crate::core::config_manager::ApiSettings;
use crate::core::ServiceClient;
use crate::utils::clean_text;

const SCRAPE_ENDPOINT: &str = "/v1/scrape";
const CONTENT_WAIT_MS: u64 = 3000;
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Returns the main content of a page as markdown-like text.
/// Errors mean "no jobs from this source"; nothing is retried.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScrapeRequest<'a> {
    url: &'a str,
    formats: [&'a str; 1],
    only_main_content: bool,
    wait_for: u64,
}

#[derive(Debug, Deserialize)]
struct ScrapeResponse {
    #[serde(default)]
    success: bool,
    data: Option<ScrapeData>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ScrapeData {
    markdown: Option<String>,
}

/// Renders pages through a Firecrawl-compatible scrape API
pub struct ScrapeApiFetcher {
    service: ServiceClient,
}

impl ScrapeApiFetcher {
    pub fn new(settings: &ApiSettings, timeout: Duration) -> Result<Self> {
        Ok(Self {
            service: ServiceClient::new(&settings.base_url, &settings.api_key, timeout)?,
        })
    }
}

#[async_trait]
impl SourceFetcher for ScrapeApiFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        info!("Scraping {} via scrape API", url);

        let request = ScrapeRequest {
            url,
            formats: ["markdown"],
            only_main_content: true,
            wait_for: CONTENT_WAIT_MS,
        };

        let response: ScrapeResponse = self
            .service
            .post_json(SCRAPE_ENDPOINT, &request)
            .await
            .with_context(|| format!("Scrape API failed for {}", url))?;

        if !response.success {
            anyhow::bail!(
                "Scrape API reported failure for {}: {}",
                url,
                response.error.unwrap_or_else(|| "no details".to_string())
            );
        }

        response
            .data
            .and_then(|data| data.markdown)
            .filter(|markdown| !markdown.trim().is_empty())
            .with_context(|| format!("No markdown content returned for {}", url))
    }
}

/// Plain GET, flattening the HTML into markdown-like lines locally
pub struct DirectFetcher {
    client: Client,
}

impl DirectFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl SourceFetcher for DirectFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        info!("Fetching {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", url))?;

        if !response.status().is_success() {
            anyhow::bail!("HTTP error {} for {}", response.status(), url);
        }

        let html = response
            .text()
            .await
            .context("Failed to read response body")?;

        Ok(html_to_markdown(&html))
    }
}

/// Headings become `#`-prefixed lines, list items `- ` lines, links keep their target
pub fn html_to_markdown(html: &str) -> String {
    let document = Html::parse_document(html);
    let selector = match Selector::parse("h1, h2, h3, h4, p, li, a[href]") {
        Ok(selector) => selector,
        Err(_) => return String::new(),
    };

    let mut lines: Vec<String> = Vec::new();
    for element in document.select(&selector) {
        // List items and paragraphs are rendered whole; skip nested matches inside them
        if element.value().name() != "li" && has_block_ancestor(&element) {
            continue;
        }

        let text = clean_text(&element.text().collect::<Vec<_>>().join(" "));
        if text.is_empty() {
            continue;
        }

        let line = match element.value().name() {
            "h1" => format!("# {}", text),
            "h2" => format!("## {}", text),
            "h3" => format!("### {}", text),
            "h4" => format!("#### {}", text),
            "li" => format!("- {}", text),
            "a" => match element.value().attr("href") {
                Some(href) if href.starts_with("http") => format!("[{}]({})", text, href),
                _ => text,
            },
            _ => text,
        };

        if lines.last() != Some(&line) {
            lines.push(line);
        }
    }

    lines.join("\n")
}

fn has_block_ancestor(element: &ElementRef) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| matches!(ancestor.value().name(), "p" | "li" | "h1" | "h2" | "h3" | "h4"))
}
