//! Google Gemini service for text generation and embeddings.
//!
//! Non-streaming client around the Generative Language REST API:
//! - POST {endpoint}/v1beta/models/{model}:generateContent
//! - POST {endpoint}/v1beta/models/{model}:embedContent
//!
//! The API key travels in the `x-goog-api-key` header, never in the URL, so
//! request URLs can be logged as-is.

use std::time::{Duration, Instant};

use reqwest::header;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        AiLlmError, HttpError, Provider, ProviderError, ProviderErrorKind, check_endpoint,
        make_snippet, transport_error,
    },
};

/// Thin client for Gemini.
#[derive(Debug)]
pub struct GeminiService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    timeout: Duration,
    url_generate: String,
    url_embed: String,
}

impl GeminiService {
    /// Creates a new [`GeminiService`] from the given config.
    ///
    /// # Errors
    /// - [`AiLlmError::Provider`] with `InvalidProvider` if `cfg.provider` is not Gemini
    /// - [`AiLlmError::Provider`] with `MissingApiKey` if `cfg.api_key` is absent
    /// - [`AiLlmError::Provider`] with `InvalidEndpoint` if `cfg.endpoint` is invalid
    /// - [`AiLlmError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        if cfg.provider != LlmProvider::Gemini {
            return Err(
                ProviderError::new(Provider::Gemini, ProviderErrorKind::InvalidProvider).into(),
            );
        }

        let api_key = cfg
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ProviderError::new(Provider::Gemini, ProviderErrorKind::MissingApiKey))?;

        let base = check_endpoint(Provider::Gemini, &cfg.endpoint)?;

        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(60));

        let mut key = header::HeaderValue::from_str(api_key.trim()).map_err(|e| {
            ProviderError::new(
                Provider::Gemini,
                ProviderErrorKind::Decode(format!("invalid API key header: {e}")),
            )
        })?;
        key.set_sensitive(true);

        let mut headers = header::HeaderMap::new();
        headers.insert("x-goog-api-key", key);

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        let model = cfg.model.trim().trim_start_matches("models/").to_string();

        info!(
            target: "ai_llm_service::gemini",
            model = %model,
            endpoint = %base,
            timeout_secs = timeout.as_secs(),
            "GeminiService initialized"
        );

        Ok(Self {
            client,
            timeout,
            url_generate: format!("{base}/v1beta/models/{model}:generateContent"),
            url_embed: format!("{base}/v1beta/models/{model}:embedContent"),
            cfg,
        })
    }

    /// Generates text via `:generateContent`.
    ///
    /// `system` is sent as `systemInstruction`; sampling parameters come from config.
    ///
    /// # Errors
    /// - [`AiLlmError::Provider`] with `HttpStatus` for non-2xx responses
    /// - [`AiLlmError::HttpTransport`] / [`AiLlmError::Timeout`] for client failures
    /// - [`AiLlmError::Provider`] with `Decode` if the JSON cannot be parsed
    /// - [`AiLlmError::Provider`] with `EmptyChoices` if no candidate carries text
    #[instrument(skip_all, fields(model = %self.cfg.model))]
    pub async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String, AiLlmError> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: prompt }],
            }],
            system_instruction: system.map(|text| Content {
                role: None,
                parts: vec![Part { text }],
            }),
            generation_config: GenerationConfig {
                temperature: self.cfg.temperature,
                top_p: self.cfg.top_p,
                top_k: self.cfg.top_k,
                max_output_tokens: self.cfg.max_tokens,
            },
        };

        debug!(prompt_len = prompt.len(), "POST {}", self.url_generate);

        let out: GenerateContentResponse = self
            .post_json(&self.url_generate, &body, "`candidates[0].content.parts[].text`")
            .await?;

        let text: String = out
            .candidates
            .into_iter()
            .find_map(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(ProviderError::new(Provider::Gemini, ProviderErrorKind::EmptyChoices).into());
        }
        Ok(text)
    }

    /// Retrieves a single embedding via `:embedContent`.
    ///
    /// # Errors
    /// - [`AiLlmError::Provider`] with `HttpStatus` for non-2xx responses
    /// - [`AiLlmError::HttpTransport`] / [`AiLlmError::Timeout`] for client failures
    /// - [`AiLlmError::Provider`] with `Decode` if the JSON cannot be parsed
    #[instrument(skip_all, fields(model = %self.cfg.model))]
    pub async fn embeddings(&self, input: &str) -> Result<Vec<f32>, AiLlmError> {
        let model = format!("models/{}", self.cfg.model.trim().trim_start_matches("models/"));
        let body = EmbedContentRequest {
            model: &model,
            content: Content {
                role: None,
                parts: vec![Part { text: input }],
            },
        };

        debug!(input_len = input.len(), "POST {}", self.url_embed);

        let out: EmbedContentResponse = self
            .post_json(&self.url_embed, &body, "`embedding.values`")
            .await?;
        Ok(out.embedding.values)
    }

    async fn post_json<B, T>(&self, url: &str, body: &B, expected: &str) -> Result<T, AiLlmError>
    where
        B: Serialize + ?Sized,
        T: for<'de> Deserialize<'de>,
    {
        let started = Instant::now();
        let resp = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);

            error!(
                %status,
                %url,
                %snippet,
                latency_ms = started.elapsed().as_millis(),
                "Gemini returned non-success status"
            );

            return Err(ProviderError::new(
                Provider::Gemini,
                ProviderErrorKind::HttpStatus(HttpError {
                    status,
                    url: url.to_string(),
                    snippet,
                }),
            )
            .into());
        }

        resp.json::<T>().await.map_err(|e| {
            error!(error = %e, %url, "failed to decode Gemini response");
            ProviderError::new(
                Provider::Gemini,
                ProviderErrorKind::Decode(format!("serde error: {e}; expected {expected}")),
            )
            .into()
        })
    }
}

/* ===========================================================================
HTTP payloads
======================================================================== */

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<PartOut>,
}

#[derive(Debug, Deserialize)]
struct PartOut {
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct EmbedContentRequest<'a> {
    model: &'a str,
    content: Content<'a>,
}

#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    embedding: EmbeddingValues,
}

#[derive(Debug, Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}
