use crate::error::RagError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Display name recorded into the pipeline configuration.
    fn name(&self) -> &str;

    /// Single-turn completion for a fully rendered prompt.
    async fn complete(&self, prompt: &str) -> Result<String, RagError>;
}

/// Chat-completion client for an OpenAI-compatible endpoint.
pub struct OpenAiChatClient {
    base_url: String,
    model: String,
    api_key: Option<String>,
    client: Client,
}

impl OpenAiChatClient {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
            client: Client::new(),
        }
    }

    /// Builds a client with the API key taken from `OPENAI_API_KEY`.
    /// A missing key surfaces as an upstream error at call time, not here.
    pub fn from_env(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self::new(base_url, model, std::env::var(OPENAI_API_KEY_VAR).ok())
    }
}

#[async_trait]
impl LlmClient for OpenAiChatClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String, RagError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| RagError::Upstream(format!("{OPENAI_API_KEY_VAR} is not set")))?;

        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "stream": false,
        });

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(RagError::Upstream(format!(
                "chat completion returned {status}: {detail}"
            )));
        }

        let payload: Value = response.json().await?;
        let content = payload
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                RagError::Upstream("chat completion response had no message content".to_string())
            })?;

        Ok(content.to_string())
    }
}
