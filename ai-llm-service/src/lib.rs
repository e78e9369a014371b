//! Shared LLM layer: provider clients (Ollama, OpenAI, Gemini), env-driven
//! configs, unified errors and the logging setup used by the binaries.

pub mod config;
pub mod error_handler;
pub mod llm_service;
pub mod services;
pub mod telemetry;

pub use config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider};
pub use error_handler::{AiLlmError, ConfigError, Provider, ProviderError, ProviderErrorKind};
pub use llm_service::{LlmService, TextGenerator};
