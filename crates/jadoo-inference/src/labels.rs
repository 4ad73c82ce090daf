//! Cloud Vision label detection backend.
//!
//! Uses `images:annotate` with `LABEL_DETECTION` and an image source URI, so
//! the image is fetched by the service and never downloaded here. A 200
//! response can still carry a per-image `error` object (unreachable URI,
//! unsupported content); that is reported as a failure, not as zero labels.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use jadoo_core::defaults::{LABEL_MAX_RESULTS, SERVICE_TIMEOUT_SECS, VISION_URL};
use jadoo_core::{Error, LabelBackend, Result};

use crate::gemini::GoogleErrorResponse;
use crate::retry::RetryPolicy;

/// Configuration for the Cloud Vision backend.
#[derive(Debug, Clone)]
pub struct CloudVisionConfig {
    /// Base URL of the Cloud Vision API.
    pub base_url: String,
    /// API key, sent as the `key` query parameter.
    pub api_key: String,
    /// Maximum labels requested per image.
    pub max_results: u32,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
    /// Retry policy for transient failures.
    pub retry: RetryPolicy,
}

impl CloudVisionConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: VISION_URL.to_string(),
            api_key: api_key.into(),
            max_results: LABEL_MAX_RESULTS,
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

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateRequest<'a> {
    requests: Vec<AnnotateImageRequest<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageRequest<'a> {
    image: ImageRef<'a>,
    features: Vec<Feature>,
}

#[derive(Serialize)]
struct ImageRef<'a> {
    source: ImageSource<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageSource<'a> {
    image_uri: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Feature {
    #[serde(rename = "type")]
    feature_type: &'static str,
    max_results: u32,
}

#[derive(Debug, Deserialize, Default)]
struct AnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    #[serde(default)]
    label_annotations: Vec<EntityAnnotation>,
    #[serde(default)]
    error: Option<StatusError>,
}

#[derive(Debug, Deserialize)]
struct EntityAnnotation {
    description: String,
}

#[derive(Debug, Deserialize)]
struct StatusError {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}

/// Cloud Vision label detection client.
pub struct CloudVisionBackend {
    client: Client,
    config: CloudVisionConfig,
}

impl CloudVisionBackend {
    pub fn new(config: CloudVisionConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(Error::Config("Cloud Vision API key is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            subsystem = "inference",
            component = "cloud_vision",
            url = %config.base_url,
            max_results = config.max_results,
            "Initializing Cloud Vision backend"
        );

        Ok(Self { client, config })
    }

    async fn annotate(&self, request: &AnnotateRequest<'_>) -> Result<AnnotateResponse> {
        let url = format!("{}/images:annotate", self.config.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .query(&[("key", self.config.api_key.as_str())])
            .json(request)
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

        response.json().await.map_err(|e| {
            Error::Serialization(format!("Failed to parse Cloud Vision response: {}", e))
        })
    }
}

#[async_trait]
impl LabelBackend for CloudVisionBackend {
    async fn detect_labels(&self, image_url: &str) -> Result<Vec<String>> {
        let start = Instant::now();
        let request = AnnotateRequest {
            requests: vec![AnnotateImageRequest {
                image: ImageRef {
                    source: ImageSource { image_uri: image_url },
                },
                features: vec![Feature {
                    feature_type: "LABEL_DETECTION",
                    max_results: self.config.max_results,
                }],
            }],
        };

        let response = self
            .config
            .retry
            .run("annotate_labels", || self.annotate(&request))
            .await?;

        let first = response.responses.into_iter().next().ok_or_else(|| {
            Error::Internal("Cloud Vision returned no response for the image".to_string())
        })?;
        if let Some(err) = first.error {
            return Err(Error::Internal(format!(
                "Cloud Vision error {}: {}",
                err.code, err.message
            )));
        }

        let labels: Vec<String> = first
            .label_annotations
            .into_iter()
            .map(|a| a.description)
            .collect();

        debug!(
            subsystem = "inference",
            component = "cloud_vision",
            op = "detect_labels",
            label_count = labels.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Label detection complete"
        );
        Ok(labels)
    }
}
