//! Web search collaborator backed by the Serper API.
//!
//! One POST per topic, localized and time-windowed so only recent content
//! comes back. Organic results are turned into [`SearchHit`]s whose ids are
//! their 1-based position in that topic's result set.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use lunathink_shared::{LunathinkError, Result, SearchConfig, SearchHit, SearchProvider, api_key};

/// User-Agent string for search requests.
const USER_AGENT: &str = concat!("Lunathink/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Resolved settings for the Serper client.
#[derive(Debug, Clone)]
pub struct SerperOptions {
    pub endpoint: String,
    pub api_key: String,
    pub country: String,
    pub num_results: u32,
    pub time_window: String,
    pub timeout_secs: u64,
}

impl SerperOptions {
    /// Build options from the `[search]` config section, reading the API key
    /// from its environment variable.
    pub fn from_config(config: &SearchConfig) -> Result<Self> {
        Ok(Self {
            endpoint: config.endpoint.clone(),
            api_key: api_key(&config.api_key_env)?,
            country: config.country.clone(),
            num_results: config.num_results,
            time_window: config.time_window.clone(),
            timeout_secs: config.timeout_secs,
        })
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct SerperRequest<'a> {
    q: &'a str,
    gl: &'a str,
    num: u32,
    tbs: &'a str,
}

#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<OrganicResult>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    #[serde(default)]
    title: String,
    link: Option<String>,
    #[serde(default)]
    snippet: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Serper-backed [`SearchProvider`].
pub struct SerperSearch {
    client: Client,
    options: SerperOptions,
}

impl SerperSearch {
    pub fn new(options: SerperOptions) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(options.timeout_secs))
            .build()
            .map_err(|e| LunathinkError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, options })
    }
}

#[async_trait]
impl SearchProvider for SerperSearch {
    #[instrument(skip(self), fields(num = self.options.num_results, tbs = %self.options.time_window))]
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let request = SerperRequest {
            q: query,
            gl: &self.options.country,
            num: self.options.num_results,
            tbs: &self.options.time_window,
        };

        let response = self
            .client
            .post(&self.options.endpoint)
            .header("X-API-KEY", &self.options.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LunathinkError::Network(format!("serper: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LunathinkError::Network(format!("serper: HTTP {status}: {body}")));
        }

        let parsed: SerperResponse = response
            .json()
            .await
            .map_err(|e| LunathinkError::parse(format!("serper response: {e}")))?;

        let hits = into_hits(query, parsed.organic);
        info!(hits = hits.len(), "search complete");
        Ok(hits)
    }
}

/// Number organic results 1..n, skipping entries without a link.
fn into_hits(query: &str, organic: Vec<OrganicResult>) -> Vec<SearchHit> {
    organic
        .into_iter()
        .filter_map(|r| match r.link {
            Some(link) => Some((r.title, link, r.snippet)),
            None => {
                debug!(title = %r.title, "organic result without link, skipping");
                None
            }
        })
        .zip(1u32..)
        .map(|((title, url, snippet), id)| SearchHit {
            id,
            title,
            url,
            snippet,
            topic: query.to_string(),
        })
        .collect()
}
