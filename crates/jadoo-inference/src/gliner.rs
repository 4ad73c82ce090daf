//! GLiNER sidecar client for zero-shot named entity recognition.
//!
//! Entities found in an image description (people, places, organizations,
//! products, ...) become extra tags. The sidecar exposes `POST /extract`
//! taking the text, the entity categories to look for, and a confidence
//! threshold.
//!
//! # Configuration
//!
//! - `GLINER_BASE_URL`: Base URL of the GLiNER sidecar. Unset or empty
//!   disables entity extraction.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use jadoo_core::defaults::SERVICE_TIMEOUT_SECS;
use jadoo_core::{Error, NerBackend, NerEntity, Result};

use crate::retry::RetryPolicy;

/// GLiNER sidecar client.
pub struct GlinerBackend {
    base_url: String,
    client: reqwest::Client,
    timeout_secs: u64,
    retry: RetryPolicy,
}

impl GlinerBackend {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            client: reqwest::Client::new(),
            timeout_secs: SERVICE_TIMEOUT_SECS,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn post_extract(&self, request: &ExtractRequest<'_>) -> Result<ExtractResponse> {
        let url = format!("{}/extract", self.base_url.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .json(request)
            .timeout(Duration::from_secs(self.timeout_secs))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Upstream {
                status: status.as_u16(),
                message: format!("GLiNER API returned {}: {}", status, body),
            });
        }

        response
            .json()
            .await
            .map_err(|e| Error::Serialization(format!("Failed to parse GLiNER response: {}", e)))
    }
}

/// Request payload for the GLiNER `/extract` endpoint.
#[derive(Serialize)]
struct ExtractRequest<'a> {
    text: &'a str,
    entity_types: &'a [&'a str],
    #[serde(skip_serializing_if = "Option::is_none")]
    threshold: Option<f32>,
}

/// Response from the GLiNER `/extract` endpoint.
#[derive(Deserialize)]
struct ExtractResponse {
    #[serde(default)]
    entities: Vec<NerEntity>,
}

#[async_trait]
impl NerBackend for GlinerBackend {
    async fn extract(
        &self,
        text: &str,
        entity_types: &[&str],
        threshold: Option<f32>,
    ) -> Result<Vec<NerEntity>> {
        if text.trim().is_empty() {
            return Ok(vec![]);
        }

        let start = Instant::now();
        let request = ExtractRequest {
            text,
            entity_types,
            threshold,
        };

        let result = self
            .retry
            .run("gliner_extract", || self.post_extract(&request))
            .await?;

        debug!(
            subsystem = "inference",
            component = "gliner",
            op = "extract",
            text_len = text.len(),
            entity_count = result.entities.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Entity extraction complete"
        );
        Ok(result.entities)
    }

    fn model_name(&self) -> &str {
        "gliner"
    }
}
