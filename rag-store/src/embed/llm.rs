//! Remote embedding backend over `ai-llm-service`.
//!
//! Works with any provider the LLM layer supports (Ollama, OpenAI, Gemini).

use std::{future::Future, pin::Pin};

use ai_llm_service::{LlmModelConfig, LlmService};
use tracing::debug;

use crate::{embed::Embedder, errors::EmbedError};

/// Probe text sent once while loading.
const WARM_UP_TEXT: &str = "warm-up";

/// Embedding backend backed by a remote model.
pub struct LlmEmbedder {
    svc: LlmService,
}

impl LlmEmbedder {
    /// Builds the client and sends one warm-up request.
    ///
    /// The warm-up forces Ollama to pull the model into memory and lets us
    /// verify the model's output size before any real request.
    ///
    /// # Errors
    /// - [`EmbedError::Unavailable`] if the client cannot be built or the probe fails
    /// - [`EmbedError::DimensionMismatch`] if the model's dimension differs from `dim`
    pub async fn load(cfg: LlmModelConfig, dim: usize) -> Result<Self, EmbedError> {
        let svc = LlmService::new(cfg).map_err(|e| EmbedError::Unavailable(e.to_string()))?;
        let probe = svc
            .embed(WARM_UP_TEXT)
            .await
            .map_err(|e| EmbedError::Unavailable(e.to_string()))?;

        if probe.len() != dim {
            return Err(EmbedError::DimensionMismatch {
                got: probe.len(),
                want: dim,
            });
        }

        debug!(
            target: "rag_store::embed",
            provider = svc.config().provider.as_str(),
            model = %svc.config().model,
            dim,
            "remote embedder warmed up"
        );
        Ok(Self { svc })
    }
}

impl Embedder for LlmEmbedder {
    fn embed<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, EmbedError>> + Send + 'a>> {
        Box::pin(async move {
            self.svc
                .embed(text)
                .await
                .map_err(|e| EmbedError::Unavailable(e.to_string()))
        })
    }
}
