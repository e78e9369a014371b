//! Optional LLM step around retrieval: query rewrite before search, answer
//! synthesis after it.
//!
//! Neither operation can fail. When no generator is configured, or the call
//! errors, or the model returns nothing, the caller gets
//! [`Enhanced::Degraded`] carrying a usable fallback value and the reason.

use std::sync::Arc;

use ai_llm_service::{AiLlmError, LlmModelConfig, LlmService, TextGenerator};
use tracing::{debug, info, warn};

use crate::prompt::{ANSWER_FORMATTER_SYSTEM, QUERY_OPTIMIZER_SYSTEM, answer_prompt, query_prompt};

/// Whether a text generator is available. Decided once at startup.
#[derive(Clone)]
pub enum EnhancementState {
    Configured(Arc<dyn TextGenerator>),
    Unconfigured,
}

impl EnhancementState {
    /// `Configured` when `cfg` is present.
    ///
    /// # Errors
    /// Returns [`AiLlmError::Config`] if the config is present but invalid.
    pub fn from_config(cfg: Option<LlmModelConfig>) -> Result<Self, AiLlmError> {
        match cfg {
            Some(cfg) => Ok(Self::Configured(Arc::new(LlmService::new(cfg)?))),
            None => Ok(Self::Unconfigured),
        }
    }

    pub fn is_configured(&self) -> bool {
        matches!(self, Self::Configured(_))
    }
}

impl std::fmt::Debug for EnhancementState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configured(g) => f.debug_tuple("Configured").field(&g.model()).finish(),
            Self::Unconfigured => f.write_str("Unconfigured"),
        }
    }
}

/// Why an enhancement fell back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DegradeReason {
    Unconfigured,
    ProviderFailed(String),
    EmptyResponse,
}

/// Outcome of an enhancement call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Enhanced<T> {
    Applied(T),
    Degraded { value: T, reason: DegradeReason },
}

impl<T> Enhanced<T> {
    pub fn value(&self) -> &T {
        match self {
            Enhanced::Applied(v) | Enhanced::Degraded { value: v, .. } => v,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Enhanced::Applied(v) | Enhanced::Degraded { value: v, .. } => v,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Enhanced::Applied(_))
    }
}

/// Stateless wrapper running the two prompts against the configured generator.
#[derive(Debug, Clone)]
pub struct Enhancer {
    state: EnhancementState,
}

impl Enhancer {
    pub fn new(state: EnhancementState) -> Self {
        Self { state }
    }

    pub fn is_configured(&self) -> bool {
        self.state.is_configured()
    }

    /// Rewrites `question` for retrieval. Falls back to `question` itself.
    pub async fn enhance(&self, question: &str) -> Enhanced<String> {
        let prompt = query_prompt(question);
        match self.run(&prompt, QUERY_OPTIMIZER_SYSTEM).await {
            Ok(rewritten) => {
                info!(
                    target: "search_service::enhance",
                    original = %question,
                    enhanced = %rewritten,
                    "query enhanced"
                );
                Enhanced::Applied(rewritten)
            }
            Err(reason) => {
                warn!(target: "search_service::enhance", ?reason, "query enhancement skipped; using original question");
                Enhanced::Degraded {
                    value: question.to_string(),
                    reason,
                }
            }
        }
    }

    /// Synthesizes one answer from ranked `fragments`. Falls back to [`render_plain`].
    pub async fn reformulate(&self, fragments: &[&str], question: &str) -> Enhanced<String> {
        let prompt = answer_prompt(question, fragments);
        match self.run(&prompt, ANSWER_FORMATTER_SYSTEM).await {
            Ok(answer) => {
                info!(target: "search_service::enhance", chars = answer.len(), "response reformulated");
                Enhanced::Applied(answer)
            }
            Err(reason) => {
                warn!(target: "search_service::enhance", ?reason, "reformulation skipped; returning plain fragments");
                Enhanced::Degraded {
                    value: render_plain(fragments),
                    reason,
                }
            }
        }
    }

    /// One generation attempt; the trimmed text, or why there is none.
    async fn run(&self, prompt: &str, system: &str) -> Result<String, DegradeReason> {
        let EnhancementState::Configured(generator) = &self.state else {
            return Err(DegradeReason::Unconfigured);
        };

        debug!(target: "search_service::enhance", model = generator.model(), "calling generator");
        match generator.generate(prompt, Some(system)).await {
            Ok(text) => {
                let text = text.trim();
                if text.is_empty() {
                    Err(DegradeReason::EmptyResponse)
                } else {
                    Ok(text.to_string())
                }
            }
            Err(e) => Err(DegradeReason::ProviderFailed(e.to_string())),
        }
    }
}

/// Deterministic plain rendering: `## Result N`, a blank line, the text;
/// blocks separated by a blank line.
pub fn render_plain(fragments: &[&str]) -> String {
    fragments
        .iter()
        .enumerate()
        .map(|(i, f)| format!("## Result {}\n\n{f}", i + 1))
        .collect::<Vec<_>>()
        .join("\n\n")
}
