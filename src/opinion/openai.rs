//! OpenAI-compatible chat completions backend.
//!
//! Serves ChatGPT and DeepSeek; DeepSeek exposes the same API at its own
//! base URL.

use crate::error::{Error, Result};
use crate::model::{Backend, ContextEntry};
use serde::{Deserialize, Serialize};

use super::config::{ensure_success, http_client, request_error};
use super::prompt::{format_context, system_prompt};
use super::OpinionBackend;

/// Default OpenAI API base URL.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// DeepSeek's OpenAI-compatible base URL.
pub const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com";

/// Chat completions client for ChatGPT or DeepSeek.
pub struct OpenAiBackend {
    client: reqwest::Client,
    backend: Backend,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiBackend {
    /// Create a client for `backend` (ChatGPT or DeepSeek).
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for other backends, or `Config` if the HTTP
    /// client cannot be built.
    pub fn new(backend: Backend, api_key: String, model: String) -> Result<Self> {
        let base_url = match backend {
            Backend::ChatGpt => OPENAI_BASE_URL,
            Backend::DeepSeek => DEEPSEEK_BASE_URL,
            Backend::Claude | Backend::Gemini => {
                return Err(Error::InvalidArgument(format!(
                    "{} does not speak the chat completions API",
                    backend.as_str()
                )));
            }
        };
        Ok(Self {
            client: http_client()?,
            backend,
            base_url: base_url.to_string(),
            api_key,
            model,
        })
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// Text of the first choice; an empty string when the model returned none.
fn extract_text(backend: Backend, response: ChatResponse) -> Result<String> {
    let choice = response.choices.into_iter().next().ok_or_else(|| Error::Backend {
        backend,
        message: "No choices in response".to_string(),
    })?;
    Ok(choice.message.content.unwrap_or_default())
}

impl OpinionBackend for OpenAiBackend {
    fn backend(&self) -> Backend {
        self.backend
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn get_opinion(&self, entry: &ContextEntry, question: Option<&str>) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let user_content = format_context(entry, question);

        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt(question),
                },
                ChatMessage {
                    role: "user",
                    content: &user_content,
                },
            ],
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| request_error(self.backend, &e))?;

        let response = ensure_success(self.backend, response).await?;

        let data: ChatResponse = response.json().await.map_err(|e| Error::Backend {
            backend: self.backend,
            message: format!("Failed to parse response: {e}"),
        })?;

        extract_text(self.backend, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_text() {
        let data: ChatResponse = serde_json::from_str(
            r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"This is a good approach"}}]}"#,
        )
        .unwrap();
        assert_eq!(
            extract_text(Backend::ChatGpt, data).unwrap(),
            "This is a good approach"
        );
    }

    #[test]
    fn test_null_content_is_empty() {
        let data: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap();
        assert_eq!(extract_text(Backend::DeepSeek, data).unwrap(), "");
    }

    #[test]
    fn test_no_choices_is_backend_error() {
        let data: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        let err = extract_text(Backend::ChatGpt, data).unwrap_err();
        assert_eq!(err.exit_code(), 9);
    }

    #[test]
    fn test_base_urls() {
        let gpt = OpenAiBackend::new(Backend::ChatGpt, "k".into(), "gpt-5.1".into()).unwrap();
        assert_eq!(gpt.base_url, OPENAI_BASE_URL);
        let deepseek =
            OpenAiBackend::new(Backend::DeepSeek, "k".into(), "deepseek-chat".into()).unwrap();
        assert_eq!(deepseek.base_url, "https://api.deepseek.com");
        assert!(OpenAiBackend::new(Backend::Claude, "k".into(), "m".into()).is_err());
    }

    #[test]
    fn test_request_shape() {
        let request = ChatRequest {
            model: "gpt-5.1",
            messages: [
                ChatMessage { role: "system", content: "sys" },
                ChatMessage { role: "user", content: "hi" },
            ],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-5.1");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hi");
    }
}
