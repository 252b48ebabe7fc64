//! OpenRouter chat-completions client.

use async_trait::async_trait;
use prompt_harness_db::ProviderConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::classify::{classify_status, classify_transport, status_detail};
use super::{Provider, ProviderFailure, ProviderOutcome, ProviderReply, http_client, missing_key};
use crate::error::RunnerError;

const DEFAULT_REFERER: &str = "http://localhost:5000";
const DEFAULT_TITLE: &str = "Financial Analysis Prompt Harness";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    max_tokens: u32,
    temperature: f64,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Client for `POST {base_url}/chat/completions`.
#[derive(Debug, Clone)]
pub struct OpenRouterProvider {
    client: reqwest::Client,
    config: ProviderConfig,
    api_key: Option<String>,
    referer: String,
    title: String,
}

impl OpenRouterProvider {
    /// Builds a client, reading the API key from the configured variable.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, RunnerError> {
        Self::with_key(config, config.api_key())
    }

    /// Builds a client with an explicit API key.
    pub fn with_key(config: &ProviderConfig, api_key: Option<String>) -> Result<Self, RunnerError> {
        Ok(Self {
            client: http_client(config)?,
            config: config.clone(),
            api_key,
            referer: DEFAULT_REFERER.to_string(),
            title: DEFAULT_TITLE.to_string(),
        })
    }

    /// Overrides the `HTTP-Referer` and `X-Title` attribution headers.
    pub fn with_attribution(mut self, referer: impl Into<String>, title: impl Into<String>) -> Self {
        self.referer = referer.into();
        self.title = title.into();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl Provider for OpenRouterProvider {
    fn name(&self) -> &str {
        "openrouter"
    }

    async fn complete(&self, prompt: &str) -> ProviderOutcome {
        let Some(ref api_key) = self.api_key else {
            return Err(missing_key(&self.config));
        };

        let body = ChatRequest {
            model: &self.config.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        debug!(model = %self.config.model, prompt_len = prompt.len(), "Calling OpenRouter");
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.title)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderFailure::new(classify_transport(&e), e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(model = %self.config.model, %status, "OpenRouter request failed");
            return Err(ProviderFailure::new(
                classify_status(status),
                status_detail(status, &text),
            ));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderFailure::new(classify_transport(&e), e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .filter(|content| !content.trim().is_empty())
            .map(ProviderReply::new)
            .ok_or_else(|| ProviderFailure::server("response contained no message content"))
    }
}
