use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{ConfigError, Result, validate_http_endpoint, validate_range_f32};

/// Configuration for an LLM model invocation.
///
/// Carries both general and provider-specific parameters. One config maps to
/// one HTTP client; build another config for a different model.
///
/// # Examples
///
/// ```
/// use ai_llm_service::config::llm_model_config::LlmModelConfig;
/// use ai_llm_service::config::llm_provider::LlmProvider;
///
/// let cfg = LlmModelConfig {
///     provider: LlmProvider::Gemini,
///     model: "gemini-1.5-flash".to_string(),
///     endpoint: "https://generativelanguage.googleapis.com".to_string(),
///     api_key: Some("key".to_string()),
///     max_tokens: None,
///     temperature: Some(0.7),
///     top_p: Some(0.9),
///     top_k: Some(40),
///     timeout_secs: Some(30),
/// };
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModelConfig {
    /// The LLM provider/backend.
    pub provider: LlmProvider,

    /// Model identifier string (e.g., `"gemini-1.5-flash"`, `"all-minilm"`).
    pub model: String,

    /// Base URL of the provider API (no path suffix).
    pub endpoint: String,

    /// Optional API key for authentication.
    pub api_key: Option<String>,

    /// Maximum number of tokens to generate.
    pub max_tokens: Option<u32>,

    /// Sampling temperature (controls creativity).
    pub temperature: Option<f32>,

    /// Nucleus sampling parameter.
    pub top_p: Option<f32>,

    /// Top-k sampling parameter (Gemini/Ollama only).
    pub top_k: Option<u32>,

    /// Optional request timeout (in seconds).
    pub timeout_secs: Option<u64>,
}

impl LlmModelConfig {
    /// Checks the invariants every provider client relies on.
    ///
    /// # Errors
    /// - [`ConfigError::EmptyModel`] for a blank model name
    /// - [`ConfigError::InvalidFormat`] for a non-http endpoint
    /// - [`ConfigError::MissingVar`] when a hosted provider has no key
    /// - [`ConfigError::OutOfRange`] for sampling parameters out of range
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::EmptyModel.into());
        }
        validate_http_endpoint("endpoint", self.endpoint.trim())?;
        if self.provider.requires_api_key()
            && self.api_key.as_deref().is_none_or(|k| k.trim().is_empty())
        {
            return Err(ConfigError::MissingVar("api_key").into());
        }
        if let Some(t) = self.temperature {
            validate_range_f32("temperature", t, 0.0, 2.0)?;
        }
        if let Some(p) = self.top_p {
            validate_range_f32("top_p", p, 0.0, 1.0)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gemini() -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::Gemini,
            model: "gemini-1.5-flash".into(),
            endpoint: "https://example.test".into(),
            api_key: Some("k".into()),
            max_tokens: None,
            temperature: Some(0.7),
            top_p: Some(0.9),
            top_k: Some(40),
            timeout_secs: Some(30),
        }
    }

    #[test]
    fn hosted_provider_requires_key() {
        let mut cfg = gemini();
        assert!(cfg.validate().is_ok());
        cfg.api_key = Some("  ".into());
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn ollama_does_not_need_key() {
        let cfg = LlmModelConfig {
            provider: LlmProvider::Ollama,
            api_key: None,
            endpoint: "http://localhost:11434".into(),
            ..gemini()
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_bad_sampling_and_model() {
        let mut cfg = gemini();
        cfg.top_p = Some(1.5);
        assert!(cfg.validate().is_err());

        let mut cfg = gemini();
        cfg.model = " ".into();
        assert!(cfg.validate().is_err());
    }
}
