//! Page fetcher backed by a JavaScript-rendering scraping API.
//!
//! The target URL is handed to the scraping service, which returns the
//! rendered HTML; the HTML is then normalized to Markdown text.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use lunathink_shared::{
    ContentSource, LunathinkError, NormalizedPage, Result, ScrapingConfig, api_key,
};

/// User-Agent string for scraping requests.
const USER_AGENT: &str = concat!("Lunathink/", env!("CARGO_PKG_VERSION"));

/// Resolved settings for the scraping API.
#[derive(Debug, Clone)]
pub struct ScrapingOptions {
    pub endpoint: String,
    pub api_key: String,
    pub render_js: bool,
    pub timeout_secs: u64,
}

impl ScrapingOptions {
    /// Build options from the `[scraping]` config section, reading the API
    /// key from its environment variable.
    pub fn from_config(config: &ScrapingConfig) -> Result<Self> {
        Ok(Self {
            endpoint: config.endpoint.clone(),
            api_key: api_key(&config.api_key_env)?,
            render_js: config.render_js,
            timeout_secs: config.timeout_secs,
        })
    }
}

/// [`ContentSource`] that fetches through the scraping API.
pub struct ScrapingFetcher {
    client: Client,
    options: ScrapingOptions,
}

impl ScrapingFetcher {
    pub fn new(options: ScrapingOptions) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(options.timeout_secs))
            .build()
            .map_err(|e| LunathinkError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, options })
    }

    /// Fetch the rendered HTML for `url`.
    ///
    /// The API key travels in the query string, so transport errors are
    /// reported without their request URL.
    async fn fetch_html(&self, url: &Url) -> Result<String> {
        let render_js = if self.options.render_js { "true" } else { "false" };

        let response = self
            .client
            .get(&self.options.endpoint)
            .query(&[
                ("api_key", self.options.api_key.as_str()),
                ("url", url.as_str()),
                ("render_js", render_js),
            ])
            .send()
            .await
            .map_err(|e| LunathinkError::Network(format!("{url}: {}", e.without_url())))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LunathinkError::Network(format!("{url}: HTTP {status}")));
        }

        response
            .text()
            .await
            .map_err(|e| {
                LunathinkError::Network(format!("{url}: body read failed: {}", e.without_url()))
            })
    }
}

#[async_trait]
impl ContentSource for ScrapingFetcher {
    #[instrument(skip(self))]
    async fn fetch_and_normalize(&self, url: &str) -> Result<NormalizedPage> {
        let parsed = validate_target(url)?;
        let html = self.fetch_html(&parsed).await?;
        debug!(bytes = html.len(), "page fetched");

        let normalized = lunathink_markdown::normalize(&html, url)?;
        if normalized.text.trim().is_empty() {
            return Err(LunathinkError::parse(format!("{url}: no readable content")));
        }

        Ok(NormalizedPage {
            text: normalized.text,
            title: normalized.title,
        })
    }
}

/// Only absolute http(s) URLs are sent to the scraping service.
fn validate_target(url: &str) -> Result<Url> {
    let parsed = Url::parse(url)
        .map_err(|e| LunathinkError::validation(format!("invalid URL '{url}': {e}")))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(LunathinkError::validation(format!(
            "unsupported URL scheme '{other}' in {url}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher(server: &MockServer) -> ScrapingFetcher {
        ScrapingFetcher::new(ScrapingOptions {
            endpoint: format!("{}/api/v1/", server.uri()),
            api_key: "scrape-key".into(),
            render_js: true,
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn validate_target_rejects_non_http() {
        assert!(validate_target("file:///etc/passwd").is_err());
        assert!(validate_target("not a url").is_err());
        assert!(validate_target("https://example.com/a").is_ok());
    }

    #[tokio::test]
    async fn fetch_and_normalize_returns_markdown() {
        let server = MockServer::start().await;

        let page = r#"<html><head><title>Lab blog</title></head><body>
            <nav><a href="/">Home</a></nav>
            <article><h1>New eval suite</h1><p>It measures long-context recall.</p></article>
        </body></html>"#;

        Mock::given(method("GET"))
            .and(path("/api/v1/"))
            .and(query_param("api_key", "scrape-key"))
            .and(query_param("url", "https://lab.example/post"))
            .and(query_param("render_js", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page))
            .mount(&server)
            .await;

        let page = fetcher(&server)
            .fetch_and_normalize("https://lab.example/post")
            .await
            .unwrap();

        assert_eq!(page.title.as_deref(), Some("New eval suite"));
        assert!(page.text.contains("long-context recall"));
        assert!(!page.text.contains("Home"));
    }

    #[tokio::test]
    async fn fetch_http_error_fails() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let err = fetcher(&server)
            .fetch_and_normalize("https://lab.example/down")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("502"));
    }

    #[tokio::test]
    async fn timeout_error_does_not_expose_api_key() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<html><body><p>late</p></body></html>")
                    .set_delay(std::time::Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let fetcher = ScrapingFetcher::new(ScrapingOptions {
            endpoint: format!("{}/api/v1/", server.uri()),
            api_key: "SECRET-SCRAPE-KEY".into(),
            render_js: true,
            timeout_secs: 1,
        })
        .unwrap();

        let err = fetcher
            .fetch_and_normalize("https://lab.example/post")
            .await
            .unwrap_err();
        let text = err.to_string();
        assert!(matches!(err, LunathinkError::Network(_)));
        assert!(text.contains("https://lab.example/post"));
        assert!(!text.contains("SECRET-SCRAPE-KEY"));
    }

    #[tokio::test]
    async fn empty_page_is_a_failure() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html><body></body></html>"))
            .mount(&server)
            .await;

        let err = fetcher(&server)
            .fetch_and_normalize("https://lab.example/blank")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no readable content"));
    }
}
