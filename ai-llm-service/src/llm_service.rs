//! Provider-agnostic LLM handle.
//!
//! - Construct once, wrap in `Arc`, and pass clones to dependents.
//! - The underlying HTTP client is built lazily on first use and cached for
//!   the lifetime of the handle.
//! - Dispatches `generate`/`embed` to the Ollama, OpenAI or Gemini client
//!   selected by [`LlmModelConfig::provider`].
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use ai_llm_service::{LlmService, config::default_config::config_generation_from_env};
//!
//! # async fn run() -> Result<(), ai_llm_service::AiLlmError> {
//! if let Some(cfg) = config_generation_from_env()? {
//!     let svc = Arc::new(LlmService::new(cfg)?);
//!     let txt = svc.generate("Hello world", None).await?;
//!     println!("{txt}");
//! }
//! # Ok(()) }
//! ```

use futures::future::BoxFuture;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::AiLlmError,
    services::{
        gemini_service::GeminiService, ollama_service::OllamaService,
        open_ai_service::OpenAiService,
    },
};

/// Opaque prompt → text transform.
///
/// Implemented by [`LlmService`]; callers that only need generation depend on
/// this trait so tests can plug in scripted generators.
pub trait TextGenerator: Send + Sync {
    /// Generates a completion for `prompt`, with an optional system instruction.
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
        system: Option<&'a str>,
    ) -> BoxFuture<'a, Result<String, AiLlmError>>;

    /// Model identifier, for logs and status reporting.
    fn model(&self) -> &str;
}

enum ProviderClient {
    Ollama(OllamaService),
    OpenAI(OpenAiService),
    Gemini(GeminiService),
}

impl ProviderClient {
    fn build(cfg: &LlmModelConfig) -> Result<Self, AiLlmError> {
        Ok(match cfg.provider {
            LlmProvider::Ollama => ProviderClient::Ollama(OllamaService::new(cfg.clone())?),
            LlmProvider::OpenAI => ProviderClient::OpenAI(OpenAiService::new(cfg.clone())?),
            LlmProvider::Gemini => ProviderClient::Gemini(GeminiService::new(cfg.clone())?),
        })
    }
}

/// Shared handle over a single model config.
pub struct LlmService {
    cfg: LlmModelConfig,
    client: OnceCell<ProviderClient>,
}

impl LlmService {
    /// Creates a new handle. No network activity happens here.
    ///
    /// # Errors
    /// Returns [`AiLlmError::Config`] if `cfg` fails validation.
    pub fn new(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            client: OnceCell::new(),
        })
    }

    /// Current config.
    pub fn config(&self) -> &LlmModelConfig {
        &self.cfg
    }

    /// Generates text with the configured model.
    ///
    /// # Errors
    /// Returns [`AiLlmError`] if the client cannot be built or the call fails.
    pub async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String, AiLlmError> {
        match self.client().await? {
            ProviderClient::Ollama(c) => c.generate(prompt, system).await,
            ProviderClient::OpenAI(c) => c.generate(prompt, system).await,
            ProviderClient::Gemini(c) => c.generate(prompt, system).await,
        }
    }

    /// Computes an embedding with the configured model.
    ///
    /// # Errors
    /// Returns [`AiLlmError`] if the client cannot be built or the call fails.
    pub async fn embed(&self, input: &str) -> Result<Vec<f32>, AiLlmError> {
        match self.client().await? {
            ProviderClient::Ollama(c) => c.embeddings(input).await,
            ProviderClient::OpenAI(c) => c.embeddings(input).await,
            ProviderClient::Gemini(c) => c.embeddings(input).await,
        }
    }

    async fn client(&self) -> Result<&ProviderClient, AiLlmError> {
        self.client
            .get_or_try_init(|| async {
                debug!(
                    target: "ai_llm_service::llm_service",
                    provider = self.cfg.provider.as_str(),
                    model = %self.cfg.model,
                    "building provider client"
                );
                ProviderClient::build(&self.cfg)
            })
            .await
    }
}

impl TextGenerator for LlmService {
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
        system: Option<&'a str>,
    ) -> BoxFuture<'a, Result<String, AiLlmError>> {
        Box::pin(LlmService::generate(self, prompt, system))
    }

    fn model(&self) -> &str {
        &self.cfg.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_invalid_config() {
        let cfg = LlmModelConfig {
            provider: LlmProvider::OpenAI,
            model: "gpt-4o-mini".into(),
            endpoint: "https://api.openai.com".into(),
            api_key: None,
            max_tokens: None,
            temperature: None,
            top_p: None,
            top_k: None,
            timeout_secs: None,
        };
        assert!(LlmService::new(cfg).is_err());
    }
}
