//! Default LLM configs loaded from environment variables.
//!
//! Two roles are supported:
//!
//! - **Generation** → text model used for query rewrite and answer synthesis.
//!   Optional: missing credentials yield `Ok(None)` so callers can run without it.
//! - **Embedding** → embedding model. Mandatory once selected.
//!
//! Every `*_from_env` function delegates to a `*_from_lookup` twin that takes
//! a `Fn(&str) -> Option<String>`, so tests can feed a map instead of the
//! process environment.
//!
//! # Environment variables
//!
//! Common:
//! - `LLM_KIND`              = generation provider (`gemini` default, `openai`, `ollama`)
//! - `LLM_MAX_TOKENS`        = optional max tokens (u32)
//! - `LLM_TIMEOUT_SECS`      = generation timeout (default 30)
//! - `EMBEDDING_MODEL`       = embedding model (provider-specific default)
//! - `EMBEDDING_TIMEOUT_SECS`= embedding timeout (default 30)
//!
//! Gemini: `GEMINI_API_KEY`, `GEMINI_MODEL`, `GEMINI_URL`
//! OpenAI: `OPENAI_API_KEY`, `OPENAI_MODEL`, `OPENAI_URL`
//! Ollama: `OLLAMA_URL` or `OLLAMA_PORT`, `OLLAMA_MODEL`

use tracing::warn;

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{AiLlmError, ConfigError, must_var, opt_var, var_opt_u32, var_opt_u64},
};

pub const GEMINI_DEFAULT_URL: &str = "https://generativelanguage.googleapis.com";
pub const GEMINI_DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const OPENAI_DEFAULT_URL: &str = "https://api.openai.com";
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4o-mini";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Resolves the Ollama endpoint.
///
/// Precedence:
/// 1. `OLLAMA_URL` if present and non-empty
/// 2. `OLLAMA_PORT` → `http://localhost:{port}`
///
/// Returns `Ok(None)` if neither is set.
///
/// # Errors
/// [`ConfigError::InvalidNumber`] if `OLLAMA_PORT` is invalid.
fn ollama_endpoint<F>(lookup: &F) -> Result<Option<String>, AiLlmError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = opt_var(lookup, "OLLAMA_URL") {
        return Ok(Some(url));
    }
    if let Some(port) = opt_var(lookup, "OLLAMA_PORT") {
        port.parse::<u16>().map_err(|_| ConfigError::InvalidNumber {
            var: "OLLAMA_PORT",
            reason: "expected u16 (1..=65535)",
        })?;
        return Ok(Some(format!("http://localhost:{port}")));
    }
    Ok(None)
}

/// Reads the generation provider from `LLM_KIND` (default `gemini`).
fn generation_provider<F>(lookup: &F) -> Result<LlmProvider, AiLlmError>
where
    F: Fn(&str) -> Option<String>,
{
    match opt_var(lookup, "LLM_KIND") {
        Some(kind) => Ok(kind.parse::<LlmProvider>()?),
        None => Ok(LlmProvider::Gemini),
    }
}

/// Builds the **generation** config from the process environment.
///
/// See [`config_generation_from_lookup`].
pub fn config_generation_from_env() -> Result<Option<LlmModelConfig>, AiLlmError> {
    config_generation_from_lookup(env_lookup)
}

/// Builds the **generation** config for the provider named in `LLM_KIND`.
///
/// Returns `Ok(None)` when the provider's credentials are absent: no API key
/// for Gemini/OpenAI, no endpoint or model for Ollama. That is a capability
/// downgrade, not a configuration error.
///
/// # Defaults
/// - `temperature = Some(0.7)`, `top_p = Some(0.9)`, `top_k = Some(40)`
/// - `timeout_secs = LLM_TIMEOUT_SECS` or 30
///
/// # Errors
/// - [`ConfigError::UnsupportedProvider`] for an unknown `LLM_KIND`
/// - [`ConfigError::InvalidNumber`] for malformed numeric variables
pub fn config_generation_from_lookup<F>(lookup: F) -> Result<Option<LlmModelConfig>, AiLlmError>
where
    F: Fn(&str) -> Option<String>,
{
    let provider = generation_provider(&lookup)?;
    let max_tokens = var_opt_u32(&lookup, "LLM_MAX_TOKENS")?;
    let timeout_secs = var_opt_u64(&lookup, "LLM_TIMEOUT_SECS")?.unwrap_or(DEFAULT_TIMEOUT_SECS);

    let (endpoint, model, api_key) = match provider {
        LlmProvider::Gemini => {
            let Some(key) = opt_var(&lookup, "GEMINI_API_KEY") else {
                warn!(
                    target: "ai_llm_service::config",
                    "GEMINI_API_KEY not set; text generation disabled"
                );
                return Ok(None);
            };
            (
                opt_var(&lookup, "GEMINI_URL").unwrap_or_else(|| GEMINI_DEFAULT_URL.into()),
                opt_var(&lookup, "GEMINI_MODEL").unwrap_or_else(|| GEMINI_DEFAULT_MODEL.into()),
                Some(key),
            )
        }
        LlmProvider::OpenAI => {
            let Some(key) = opt_var(&lookup, "OPENAI_API_KEY") else {
                warn!(
                    target: "ai_llm_service::config",
                    "OPENAI_API_KEY not set; text generation disabled"
                );
                return Ok(None);
            };
            (
                opt_var(&lookup, "OPENAI_URL").unwrap_or_else(|| OPENAI_DEFAULT_URL.into()),
                opt_var(&lookup, "OPENAI_MODEL").unwrap_or_else(|| OPENAI_DEFAULT_MODEL.into()),
                Some(key),
            )
        }
        LlmProvider::Ollama => {
            let endpoint = ollama_endpoint(&lookup)?;
            let model = opt_var(&lookup, "OLLAMA_MODEL");
            let (Some(endpoint), Some(model)) = (endpoint, model) else {
                warn!(
                    target: "ai_llm_service::config",
                    "OLLAMA_URL/OLLAMA_PORT or OLLAMA_MODEL not set; text generation disabled"
                );
                return Ok(None);
            };
            (endpoint, model, None)
        }
    };

    Ok(Some(LlmModelConfig {
        provider,
        model,
        endpoint,
        api_key,
        max_tokens,
        temperature: Some(0.7),
        top_p: Some(0.9),
        top_k: Some(40),
        timeout_secs: Some(timeout_secs),
    }))
}

/// Builds the **embedding** config for `provider` from the process environment.
///
/// See [`config_embedding_from_lookup`].
pub fn config_embedding_from_env(provider: LlmProvider) -> Result<LlmModelConfig, AiLlmError> {
    config_embedding_from_lookup(provider, env_lookup)
}

/// Builds the **embedding** config for `provider`.
///
/// # Env
/// - `EMBEDDING_MODEL` (defaults: `all-minilm`, `text-embedding-3-small`, `text-embedding-004`)
/// - `EMBEDDING_TIMEOUT_SECS` (default 30)
/// - provider endpoint and key variables (required)
///
/// # Defaults
/// - `temperature = Some(0.0)` (deterministic)
/// - `max_tokens = None`
///
/// # Errors
/// [`ConfigError::MissingVar`] if the provider's endpoint or key is absent.
pub fn config_embedding_from_lookup<F>(
    provider: LlmProvider,
    lookup: F,
) -> Result<LlmModelConfig, AiLlmError>
where
    F: Fn(&str) -> Option<String>,
{
    let timeout_secs =
        var_opt_u64(&lookup, "EMBEDDING_TIMEOUT_SECS")?.unwrap_or(DEFAULT_TIMEOUT_SECS);

    let (endpoint, default_model, api_key) = match provider {
        LlmProvider::Ollama => {
            let endpoint = ollama_endpoint(&lookup)?
                .ok_or(ConfigError::MissingVar("OLLAMA_URL or OLLAMA_PORT"))?;
            (endpoint, "all-minilm", None)
        }
        LlmProvider::OpenAI => (
            opt_var(&lookup, "OPENAI_URL").unwrap_or_else(|| OPENAI_DEFAULT_URL.into()),
            "text-embedding-3-small",
            Some(must_var(&lookup, "OPENAI_API_KEY")?),
        ),
        LlmProvider::Gemini => (
            opt_var(&lookup, "GEMINI_URL").unwrap_or_else(|| GEMINI_DEFAULT_URL.into()),
            "text-embedding-004",
            Some(must_var(&lookup, "GEMINI_API_KEY")?),
        ),
    };

    let model = opt_var(&lookup, "EMBEDDING_MODEL").unwrap_or_else(|| default_model.to_string());

    Ok(LlmModelConfig {
        provider,
        model,
        endpoint,
        api_key,
        max_tokens: None,
        temperature: Some(0.0),
        top_p: None,
        top_k: None,
        timeout_secs: Some(timeout_secs),
    })
}
