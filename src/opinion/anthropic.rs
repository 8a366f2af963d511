//! Anthropic Messages API backend.

use crate::error::{Error, Result};
use crate::model::{Backend, ContextEntry};
use serde::{Deserialize, Serialize};

use super::config::{ensure_success, http_client, request_error};
use super::prompt::{format_context, system_prompt};
use super::OpinionBackend;

/// Messages API endpoint.
pub const ANTHROPIC_MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";

/// API version header value.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

const MAX_TOKENS: u32 = 4096;
const TEMPERATURE: f32 = 0.7;

/// Claude client.
pub struct ClaudeBackend {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl ClaudeBackend {
    /// Create a Claude client.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the HTTP client cannot be built.
    pub fn new(api_key: String, model: String) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            endpoint: ANTHROPIC_MESSAGES_URL.to_string(),
            api_key,
            model,
        })
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: [Message<'a>; 1],
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Text of the first content block, or empty when it is not a text block.
fn extract_text(response: MessagesResponse) -> String {
    response
        .content
        .into_iter()
        .next()
        .filter(|block| block.kind == "text")
        .and_then(|block| block.text)
        .unwrap_or_default()
}

impl OpinionBackend for ClaudeBackend {
    fn backend(&self) -> Backend {
        Backend::Claude
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn get_opinion(&self, entry: &ContextEntry, question: Option<&str>) -> Result<String> {
        let user_content = format_context(entry, question);
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            system: system_prompt(question),
            messages: [Message {
                role: "user",
                content: &user_content,
            }],
            temperature: TEMPERATURE,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| request_error(Backend::Claude, &e))?;

        let response = ensure_success(Backend::Claude, response).await?;

        let data: MessagesResponse = response.json().await.map_err(|e| Error::Backend {
            backend: Backend::Claude,
            message: format!("Failed to parse response: {e}"),
        })?;

        Ok(extract_text(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_text_block() {
        let data: MessagesResponse = serde_json::from_str(
            r#"{"id":"msg_1","role":"assistant","content":[{"type":"text","text":"Looks fixable"}],"stop_reason":"end_turn"}"#,
        )
        .unwrap();
        assert_eq!(extract_text(data), "Looks fixable");
    }

    #[test]
    fn test_non_text_or_empty_content() {
        let tool: MessagesResponse = serde_json::from_str(
            r#"{"content":[{"type":"tool_use","id":"t","name":"x","input":{}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_text(tool), "");

        let empty: MessagesResponse = serde_json::from_str(r#"{"content":[]}"#).unwrap();
        assert_eq!(extract_text(empty), "");
    }

    #[test]
    fn test_request_shape() {
        let request = MessagesRequest {
            model: "claude-sonnet-4-5-20250929",
            max_tokens: MAX_TOKENS,
            system: "sys",
            messages: [Message { role: "user", content: "hi" }],
            temperature: TEMPERATURE,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["max_tokens"], 4096);
        assert_eq!(json["system"], "sys");
        assert_eq!(json["messages"][0]["role"], "user");
        assert!((json["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    }
}
