use std::str::FromStr;

use crate::error_handler::ConfigError;

/// Represents the provider (backend) used for large language model (LLM) inference.
///
/// Parsed case-insensitively from `LLM_KIND` / `EMBEDDING_PROVIDER`.
///
/// # Examples
///
/// ```
/// use ai_llm_service::config::llm_provider::LlmProvider;
///
/// let p: LlmProvider = "Gemini".parse().unwrap();
/// assert_eq!(p, LlmProvider::Gemini);
/// assert!(p.requires_api_key());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LlmProvider {
    /// Local Ollama runtime for on-device inference.
    Ollama,
    /// OpenAI REST API.
    OpenAI,
    /// Google Gemini (Generative Language API).
    Gemini,
}

impl LlmProvider {
    /// Hosted providers cannot be reached without a key.
    pub fn requires_api_key(self) -> bool {
        matches!(self, LlmProvider::OpenAI | LlmProvider::Gemini)
    }

    /// Stable lowercase name, used in logs and status payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            LlmProvider::Ollama => "ollama",
            LlmProvider::OpenAI => "openai",
            LlmProvider::Gemini => "gemini",
        }
    }
}

impl FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(LlmProvider::Ollama),
            "openai" | "chatgpt" => Ok(LlmProvider::OpenAI),
            "gemini" | "google" => Ok(LlmProvider::Gemini),
            other => Err(ConfigError::UnsupportedProvider(other.to_string())),
        }
    }
}
