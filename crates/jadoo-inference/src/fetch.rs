//! HTTP image download.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::debug;

use jadoo_core::defaults::SERVICE_TIMEOUT_SECS;
use jadoo_core::{
    detect_image_type, media_type_from_url, Error, ImageFetcher, ImageMediaType, ImagePayload,
    Result,
};

use crate::retry::RetryPolicy;

/// Downloads images over HTTP(S).
///
/// The MIME type of the payload is taken from the magic bytes when they are
/// recognised, then the `Content-Type` header, then the URL extension, and
/// finally defaults to `image/jpeg`.
pub struct HttpImageFetcher {
    client: Client,
    retry: RetryPolicy,
}

impl HttpImageFetcher {
    pub fn new(timeout_seconds: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_defaults() -> Result<Self> {
        Self::new(SERVICE_TIMEOUT_SECS)
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn get_once(&self, url: &str) -> Result<ImagePayload> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Upstream {
                status: status.as_u16(),
                message: format!("GET {} returned {}", url, status),
            });
        }

        let header_mime = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string());

        let data = response.bytes().await?.to_vec();
        let mime_type = resolve_mime(&data, header_mime.as_deref(), url);
        Ok(ImagePayload { data, mime_type })
    }
}

fn resolve_mime(data: &[u8], header_mime: Option<&str>, url: &str) -> String {
    if let Some(detected) = detect_image_type(data) {
        return detected.mime_type().to_string();
    }
    if let Some(mime) = header_mime.filter(|m| m.starts_with("image/")) {
        return ImageMediaType::from_mime(mime).mime_type().to_string();
    }
    media_type_from_url(url)
        .unwrap_or(ImageMediaType::Jpeg)
        .mime_type()
        .to_string()
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<ImagePayload> {
        let start = Instant::now();
        let payload = self
            .retry
            .run("image_fetch", || self.get_once(url))
            .await
            .map_err(|e| Error::Fetch(e.to_string()))?;

        debug!(
            subsystem = "inference",
            component = "fetch",
            op = "get",
            mime_type = %payload.mime_type,
            bytes = payload.data.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Image downloaded"
        );
        Ok(payload)
    }
}
