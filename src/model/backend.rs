//! Opinion backend identifiers.
//!
//! Each backend owns one response column on the `contexts` table and one pair
//! of environment variables (API key, model override).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An LLM service that can give a second opinion on a context entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    ChatGpt,
    Claude,
    Gemini,
    DeepSeek,
}

impl Backend {
    /// All backends, in display order.
    pub const ALL: [Self; 4] = [Self::ChatGpt, Self::Claude, Self::Gemini, Self::DeepSeek];

    /// Lowercase identifier used on the command line and in JSON.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ChatGpt => "chatgpt",
            Self::Claude => "claude",
            Self::Gemini => "gemini",
            Self::DeepSeek => "deepseek",
        }
    }

    /// Column on `contexts` holding this backend's response.
    #[must_use]
    pub const fn response_column(&self) -> &'static str {
        match self {
            Self::ChatGpt => "chatgpt_response",
            Self::Claude => "claude_response",
            Self::Gemini => "gemini_response",
            Self::DeepSeek => "deepseek_response",
        }
    }

    /// Environment variable consulted when no API key is passed explicitly.
    #[must_use]
    pub const fn api_key_env(&self) -> &'static str {
        match self {
            Self::ChatGpt => "OPENAI_API_KEY",
            Self::Claude => "ANTHROPIC_API_KEY",
            Self::Gemini => "GOOGLE_API_KEY",
            Self::DeepSeek => "DEEPSEEK_API_KEY",
        }
    }

    /// Environment variable that overrides the default model.
    #[must_use]
    pub const fn model_env(&self) -> &'static str {
        match self {
            Self::ChatGpt => "MCP_TOOLZ_MODEL",
            Self::Claude => "MCP_TOOLZ_CLAUDE_MODEL",
            Self::Gemini => "MCP_TOOLZ_GEMINI_MODEL",
            Self::DeepSeek => "MCP_TOOLZ_DEEPSEEK_MODEL",
        }
    }

    /// Model used when neither an explicit value nor the env override is set.
    #[must_use]
    pub const fn default_model(&self) -> &'static str {
        match self {
            Self::ChatGpt => "gpt-5.1",
            Self::Claude => "claude-sonnet-4-5-20250929",
            Self::Gemini => "gemini-2.5-flash",
            Self::DeepSeek => "deepseek-chat",
        }
    }

    /// Vendor-facing name for messages.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::ChatGpt => "OpenAI",
            Self::Claude => "Anthropic",
            Self::Gemini => "Google",
            Self::DeepSeek => "DeepSeek",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "chatgpt" | "openai" | "gpt" => Ok(Self::ChatGpt),
            "claude" | "anthropic" => Ok(Self::Claude),
            "gemini" | "google" => Ok(Self::Gemini),
            "deepseek" => Ok(Self::DeepSeek),
            other => Err(format!(
                "unknown backend '{other}' (expected chatgpt, claude, gemini or deepseek)"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!("ChatGPT".parse::<Backend>().unwrap(), Backend::ChatGpt);
        assert_eq!("anthropic".parse::<Backend>().unwrap(), Backend::Claude);
        assert_eq!("google".parse::<Backend>().unwrap(), Backend::Gemini);
        assert_eq!("deepseek".parse::<Backend>().unwrap(), Backend::DeepSeek);
        assert!("llama".parse::<Backend>().is_err());
    }

    #[test]
    fn test_eight_environment_variables() {
        let mut names: Vec<&str> = Backend::ALL
            .iter()
            .flat_map(|b| [b.api_key_env(), b.model_env()])
            .collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 8);
    }
}
