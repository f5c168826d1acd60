//! Minimal OpenAI chat-completions client.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, instrument};

use lunathink_shared::{LunathinkError, OpenAiConfig, Result, api_key};

use crate::schema::StructuredOutput;
use crate::types::{ApiErrorBody, ChatMessage, ChatRequest, ChatResponse};

#[derive(Clone)]
pub struct OpenAiClient {
    http: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| LunathinkError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Build a client from the `[openai]` config section, reading the API key
    /// from its environment variable.
    pub fn from_config(config: &OpenAiConfig) -> Result<Self> {
        Self::new(api_key(&config.api_key_env)?, &config.base_url, config.timeout_secs)
    }

    /// Plain completion; returns the assistant text.
    pub async fn chat(&self, model: &str, messages: Vec<ChatMessage>) -> Result<String> {
        self.complete(&ChatRequest::new(model, messages)).await
    }

    /// Completion constrained to the schema of `T`, deserialized into `T`.
    #[instrument(skip_all, fields(model = %model, output = %T::output_name()))]
    pub async fn extract<T: StructuredOutput>(&self, model: &str, messages: Vec<ChatMessage>) -> Result<T> {
        let request =
            ChatRequest::new(model, messages).with_json_schema(T::output_name(), T::strict_schema());
        let content = self.complete(&request).await?;

        serde_json::from_str(&content)
            .map_err(|e| LunathinkError::Llm(format!("malformed {} reply: {e}", T::output_name())))
    }

    async fn complete(&self, request: &ChatRequest) -> Result<String> {
        debug!(model = %request.model, messages = request.messages.len(), "chat completion");

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| LunathinkError::Llm(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or(body);
            return Err(LunathinkError::Llm(format!("HTTP {status}: {detail}")));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| LunathinkError::Llm(format!("unreadable response: {e}")))?;

        let message = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| LunathinkError::Llm("response has no choices".into()))?;

        match (message.content, message.refusal) {
            (Some(content), _) if !content.trim().is_empty() => Ok(content),
            (_, Some(refusal)) => Err(LunathinkError::Llm(format!("model refused: {refusal}"))),
            _ => Err(LunathinkError::Llm("empty completion".into())),
        }
    }
}
