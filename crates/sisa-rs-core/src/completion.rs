//! Chat-completion client seam.
//!
//! Handlers never talk to an HTTP API directly; they hold an
//! `Arc<dyn CompletionClient>` so tests can substitute canned output.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sisa_rs_config::CompletionConfig;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by completion clients.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// The configured API-key environment variable is unset or empty.
    #[error("completion api key not found in environment variable {0}")]
    MissingApiKey(String),
    /// Transport-level failure.
    #[error("completion request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The API returned a non-success status.
    #[error("completion api returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated for logging.
        body: String,
    },
    /// The API returned a success with no usable message content.
    #[error("completion api returned an empty response")]
    EmptyResponse,
    /// JSON-mode output that did not parse as the requested shape.
    #[error("completion returned malformed json: {0}")]
    MalformedJson(String),
}

/// Output contract requested from the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    /// Free-form prose.
    Text,
    /// A single JSON object.
    Json,
}

/// Abstraction over a chat-completion backend.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Run one completion and return the raw assistant text.
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        mode: ResponseMode,
    ) -> Result<String, CompletionError>;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Completion client backed by an OpenAI-compatible chat-completions API.
pub struct HttpCompletionClient {
    config: CompletionConfig,
    client: reqwest::Client,
}

impl HttpCompletionClient {
    /// Build a client from configuration. Fails only on TLS/client setup.
    pub fn new(config: CompletionConfig) -> Result<Self, CompletionError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { config, client })
    }

    fn api_key(&self) -> Result<String, CompletionError> {
        match std::env::var(&self.config.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(CompletionError::MissingApiKey(
                self.config.api_key_env.clone(),
            )),
        }
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        mode: ResponseMode,
    ) -> Result<String, CompletionError> {
        let api_key = self.api_key()?;
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let request = ChatCompletionRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            max_tokens: self.config.max_tokens,
            response_format: match mode {
                ResponseMode::Text => None,
                ResponseMode::Json => Some(ResponseFormat {
                    format_type: "json_object",
                }),
            },
        };

        log::debug!(
            "sending completion request (model={}, mode={:?})",
            self.config.model,
            mode
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            body.truncate(512);
            return Err(CompletionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatCompletionResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(CompletionError::EmptyResponse)?;
        if content.trim().is_empty() {
            return Err(CompletionError::EmptyResponse);
        }
        Ok(content)
    }
}

/// Parse JSON-mode output into the handler's expected shape.
pub fn parse_json_completion<T: serde::de::DeserializeOwned>(
    raw: &str,
) -> Result<T, CompletionError> {
    // Some models wrap JSON mode output in a markdown fence despite the
    // response_format hint; strip it before parsing.
    let trimmed = raw.trim();
    let stripped = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed);
    serde_json::from_str(stripped).map_err(|err| CompletionError::MalformedJson(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Sample {
        total: f64,
    }

    #[test]
    fn parses_plain_json_output() {
        let parsed: Sample = parse_json_completion("{\"total\": 390.0}").unwrap();
        assert_eq!(parsed, Sample { total: 390.0 });
    }

    #[test]
    fn strips_markdown_fences_around_json() {
        let raw = "```json\n{\"total\": 90.5}\n```";
        let parsed: Sample = parse_json_completion(raw).unwrap();
        assert_eq!(parsed, Sample { total: 90.5 });
    }

    #[test]
    fn malformed_json_is_reported() {
        let err = parse_json_completion::<Sample>("not json").unwrap_err();
        assert!(matches!(err, CompletionError::MalformedJson(_)));
    }
}
