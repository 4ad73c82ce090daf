//! Gemini backend implementation.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info};

use jadoo_core::defaults::{EMBED_DIMENSION, EMBED_MODEL, GEMINI_URL, GEN_MODEL, SERVICE_TIMEOUT_SECS};
use jadoo_core::{EmbeddingBackend, Error, ImagePayload, Result, Vector, VisionBackend};

use super::types::*;
use crate::retry::RetryPolicy;

/// Configuration for the Gemini backend.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// Base URL of the Generative Language API.
    pub base_url: String,
    /// API key, sent as the `key` query parameter.
    pub api_key: String,
    /// Model used for descriptions and question answering.
    pub gen_model: String,
    /// Model used for embeddings.
    pub embed_model: String,
    /// Expected embedding dimension.
    pub embed_dimension: usize,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
    /// Retry policy for transient failures.
    pub retry: RetryPolicy,
}

impl GeminiConfig {
    /// Default models and endpoint with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: GEMINI_URL.to_string(),
            api_key: api_key.into(),
            gen_model: GEN_MODEL.to_string(),
            embed_model: EMBED_MODEL.to_string(),
            embed_dimension: EMBED_DIMENSION,
            timeout_seconds: SERVICE_TIMEOUT_SECS,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

/// Gemini vision-language and embedding backend.
pub struct GeminiBackend {
    client: Client,
    config: GeminiConfig,
}

impl GeminiBackend {
    /// Create a new Gemini backend with the given configuration.
    pub fn new(config: GeminiConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(Error::Config("Gemini API key is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            subsystem = "inference",
            component = "gemini",
            url = %config.base_url,
            gen_model = %config.gen_model,
            embed_model = %config.embed_model,
            "Initializing Gemini backend"
        );

        Ok(Self { client, config })
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        let model = model.strip_prefix("models/").unwrap_or(model);
        format!(
            "{}/models/{}:{}",
            self.config.base_url.trim_end_matches('/'),
            model,
            method
        )
    }

    async fn post_json<Req, Resp>(&self, url: &str, body: &Req) -> Result<Resp>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let response = self
            .client
            .post(url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Upstream {
                status: status.as_u16(),
                message: GoogleErrorResponse::message_from(&body),
            });
        }

        response
            .json::<Resp>()
            .await
            .map_err(|e| Error::Serialization(format!("Failed to parse Gemini response: {}", e)))
    }
}

#[async_trait]
impl VisionBackend for GeminiBackend {
    async fn describe_image(&self, image: &ImagePayload, prompt: &str) -> Result<String> {
        let start = Instant::now();
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![
                    Part::text(prompt),
                    Part::inline(image.mime_type.as_str(), STANDARD.encode(&image.data)),
                ],
            }],
        };
        let url = self.model_url(&self.config.gen_model, "generateContent");

        debug!(
            subsystem = "inference",
            component = "gemini",
            op = "generate_content",
            model = %self.config.gen_model,
            mime_type = %image.mime_type,
            image_bytes = image.data.len(),
            prompt_len = prompt.len(),
            "Sending multimodal request"
        );

        let response: GenerateContentResponse = self
            .config
            .retry
            .run("generate_content", || self.post_json(&url, &request))
            .await?;

        if let Some(reason) = response
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            return Err(Error::Internal(format!(
                "Gemini blocked the request: {}",
                reason
            )));
        }

        let text = response
            .first_text()
            .ok_or_else(|| Error::Internal("Gemini returned no text candidate".to_string()))?
            .to_string();

        debug!(
            subsystem = "inference",
            component = "gemini",
            op = "generate_content",
            response_len = text.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Generation complete"
        );
        Ok(text)
    }

    fn model_name(&self) -> &str {
        &self.config.gen_model
    }
}

#[async_trait]
impl EmbeddingBackend for GeminiBackend {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let model = format!(
            "models/{}",
            self.config
                .embed_model
                .strip_prefix("models/")
                .unwrap_or(&self.config.embed_model)
        );
        let request = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|text| EmbedContentRequest {
                    model: model.clone(),
                    content: Content {
                        role: None,
                        parts: vec![Part::text(text.as_str())],
                    },
                })
                .collect(),
        };
        let url = self.model_url(&self.config.embed_model, "batchEmbedContents");

        debug!(
            subsystem = "inference",
            component = "gemini",
            op = "embed",
            model = %self.config.embed_model,
            count = texts.len(),
            "Embedding texts"
        );

        let response: BatchEmbedResponse = self
            .config
            .retry
            .run("batch_embed_contents", || self.post_json(&url, &request))
            .await?;

        if response.embeddings.len() != texts.len() {
            return Err(Error::Internal(format!(
                "Gemini returned {} embeddings for {} texts",
                response.embeddings.len(),
                texts.len()
            )));
        }

        response
            .embeddings
            .into_iter()
            .map(|e| {
                if e.values.len() != self.config.embed_dimension {
                    return Err(Error::Internal(format!(
                        "Embedding dimension mismatch: expected {}, got {}",
                        self.config.embed_dimension,
                        e.values.len()
                    )));
                }
                Ok(Vector::from(e.values))
            })
            .collect()
    }

    fn dimension(&self) -> usize {
        self.config.embed_dimension
    }

    fn model_name(&self) -> &str {
        &self.config.embed_model
    }
}
