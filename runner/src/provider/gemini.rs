//! Google Gemini `generateContent` client.

use async_trait::async_trait;
use prompt_harness_db::ProviderConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::classify::{classify_status, classify_transport, status_detail};
use super::{Provider, ProviderFailure, ProviderOutcome, ProviderReply, http_client, missing_key};
use crate::error::RunnerError;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Client for `POST {base_url}/models/{model}:generateContent`.
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    client: reqwest::Client,
    config: ProviderConfig,
    api_key: Option<String>,
}

impl GeminiProvider {
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
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, prompt: &str) -> ProviderOutcome {
        let Some(ref api_key) = self.api_key else {
            return Err(missing_key(&self.config));
        };

        let body = GenerateRequest {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_tokens,
            },
        };

        debug!(model = %self.config.model, prompt_len = prompt.len(), "Calling Gemini");
        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", api_key.as_str())])
            .json(&body)
            .send()
            .await
            // reqwest errors can embed the request URL, which carries the key
            .map_err(|e| ProviderFailure::new(classify_transport(&e), e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(model = %self.config.model, %status, "Gemini request failed");
            return Err(ProviderFailure::new(
                classify_status(status),
                status_detail(status, &text),
            ));
        }

        let parsed: GenerateResponse = response.json().await.map_err(|e| {
            ProviderFailure::new(classify_transport(&e), e.without_url().to_string())
        })?;

        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .and_then(|content| content.parts.into_iter().next())
            .and_then(|part| part.text)
            .filter(|text| !text.trim().is_empty())
            .map(ProviderReply::new)
            .ok_or_else(|| ProviderFailure::server("response contained no candidate text"))
    }
}
