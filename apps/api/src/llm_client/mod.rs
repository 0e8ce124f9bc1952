//! Completion client — the single point of entry for all completion-provider
//! calls in the ranking service.
//!
//! The provider speaks a chat-style wire format: one POST per scored resume
//! with `{ "models": [<model id>], "message": <prompt> }` and bearer-token
//! auth, answered by an envelope whose leaf is `choices[0].message.content`.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Default completion endpoint. Override with `COMPLETION_API_URL`.
pub const DEFAULT_COMPLETION_API_URL: &str =
    "https://api.us.inc/usf/v1/hiring/chat/completions";
/// The model used for all scoring calls.
/// This is intentionally hardcoded to prevent accidental drift.
pub const MODEL: &str = "usf1-mini";
const REQUEST_TIMEOUT_SECS: u64 = 60;
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("completion returned empty content")]
    EmptyContent,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    models: [&'a str; 1],
    message: &'a str,
}

/// Provider response envelope. Some deployments nest the chat payload under
/// `result`, others return `choices` at the top level — both are tolerated.
#[derive(Debug, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    result: Option<ChatPayload>,
    #[serde(default)]
    choices: Option<Vec<Choice>>,
}

#[derive(Debug, Deserialize)]
struct ChatPayload {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: String,
}

impl CompletionResponse {
    /// Extracts the completion text from the first choice, wherever it nests.
    pub fn content(&self) -> Option<&str> {
        let choices = match (&self.choices, &self.result) {
            (Some(choices), _) => choices.as_slice(),
            (None, Some(payload)) => payload.choices.as_slice(),
            (None, None) => return None,
        };
        choices
            .first()
            .map(|c| c.message.content.as_str())
            .filter(|content| !content.is_empty())
    }
}

/// The single completion client used by the scoring pipeline.
/// Wraps the provider API with a bounded timeout and retry logic.
#[derive(Clone)]
pub struct CompletionClient {
    client: Client,
    api_key: String,
    api_url: String,
}

impl CompletionClient {
    pub fn new(api_key: String, api_url: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
            api_url,
        }
    }

    /// Sends one prompt and returns the raw completion text.
    /// Retries transport errors, 429 and 5xx with exponential backoff.
    pub async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let request_body = CompletionRequest {
            models: [MODEL],
            message: prompt,
        };

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "completion call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&self.api_url)
                .bearer_auth(&self.api_key)
                .header("content-type", "application/json")
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("completion API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message: provider_error_message(body),
                });
            }

            let completion: CompletionResponse = response.json().await?;
            let content = completion.content().ok_or(LlmError::EmptyContent)?;

            debug!("completion call succeeded ({} chars)", content.len());

            return Ok(content.to_string());
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }
}

/// Pulls a human-readable message out of a provider error body,
/// falling back to the raw body.
fn provider_error_message(body: String) -> String {
    serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .or_else(|| v.get("message"))
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_from_top_level_choices() {
        let json = r#"{"choices": [{"message": {"content": "hello"}}]}"#;
        let response: CompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.content(), Some("hello"));
    }

    #[test]
    fn test_content_nested_under_result() {
        let json = r#"{"result": {"choices": [{"message": {"content": "nested"}}]}}"#;
        let response: CompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.content(), Some("nested"));
    }

    #[test]
    fn test_empty_envelope_has_no_content() {
        let response: CompletionResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(response.content(), None);

        let blank: CompletionResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"content": ""}}]}"#).unwrap();
        assert_eq!(blank.content(), None);
    }

    #[test]
    fn test_provider_error_message_prefers_structured_body() {
        let body = r#"{"error": {"message": "invalid api key"}}"#.to_string();
        assert_eq!(provider_error_message(body), "invalid api key");

        let flat = r#"{"message": "quota exceeded"}"#.to_string();
        assert_eq!(provider_error_message(flat), "quota exceeded");

        let raw = "gateway timeout".to_string();
        assert_eq!(provider_error_message(raw), "gateway timeout");
    }
}
