//! Google Gemini `generateContent` backend.

use crate::error::{Error, Result};
use crate::model::{Backend, ContextEntry};
use serde::{Deserialize, Serialize};

use super::config::{ensure_success, http_client, request_error};
use super::prompt::{format_context, system_prompt};
use super::OpinionBackend;

/// Generative Language API base URL.
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini client.
pub struct GeminiBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiBackend {
    /// Create a Gemini client.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the HTTP client cannot be built.
    pub fn new(api_key: String, model: String) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            base_url: GEMINI_BASE_URL.to_string(),
            api_key,
            model,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

/// Concatenated text parts of the first candidate.
fn extract_text(response: GenerateResponse) -> Result<String> {
    let candidate = response.candidates.into_iter().next().ok_or_else(|| Error::Backend {
        backend: Backend::Gemini,
        message: "No candidates in response (the prompt may have been blocked)".to_string(),
    })?;

    Ok(candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default())
}

impl OpinionBackend for GeminiBackend {
    fn backend(&self) -> Backend {
        Backend::Gemini
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn get_opinion(&self, entry: &ContextEntry, question: Option<&str>) -> Result<String> {
        let user_content = format_context(entry, question);
        let request = GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: [Part {
                    text: system_prompt(question),
                }],
            },
            contents: [Content {
                role: Some("user"),
                parts: [Part {
                    text: &user_content,
                }],
            }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| request_error(Backend::Gemini, &e))?;

        let response = ensure_success(Backend::Gemini, response).await?;

        let data: GenerateResponse = response.json().await.map_err(|e| Error::Backend {
            backend: Backend::Gemini,
            message: format!("Failed to parse response: {e}"),
        })?;

        extract_text(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_includes_model() {
        let backend = GeminiBackend::new("k".into(), "gemini-2.5-flash".into()).unwrap();
        assert_eq!(
            backend.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let data: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Use "},{"text":"a lock."}]},"finishReason":"STOP"}]}"#,
        )
        .unwrap();
        assert_eq!(extract_text(data).unwrap(), "Use a lock.");
    }

    #[test]
    fn test_no_candidates_is_error() {
        let data: GenerateResponse =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap();
        assert!(extract_text(data).is_err());
    }

    #[test]
    fn test_request_uses_system_instruction() {
        let request = GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: [Part { text: "sys" }],
            },
            contents: [Content {
                role: Some("user"),
                parts: [Part { text: "hi" }],
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "sys");
        assert!(json["systemInstruction"].get("role").is_none());
        assert_eq!(json["contents"][0]["role"], "user");
    }
}
