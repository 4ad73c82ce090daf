//! Image enrichment pipeline.
//!
//! ```text
//!            ┌─ detect labels (URL) ─────────────┐
//! resolve ──┤                                    ├─ merge tags ─ persist
//!            └─ fetch + describe ─┬─ entities ───┤
//!                                 └─ embedding ──┘
//! ```
//!
//! Labels and description run concurrently; entity extraction and embedding
//! both wait for the description and run concurrently with each other. The
//! record is written once, after every stage has succeeded.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use jadoo_core::defaults::{ENTITY_THRESHOLD, ENTITY_TYPES, SERVICE_TIMEOUT_SECS};
use jadoo_core::{
    media_type_from_url, EmbeddingBackend, EnrichmentResult, Error, ImageFetcher,
    ImageMediaType, ImageRepository, LabelBackend, NerBackend, Result, Stage, Vector,
    VisionBackend, DESCRIBE_IMAGE_PROMPT,
};

/// Message returned when the record is missing or has no URL.
pub const IMAGE_URL_NOT_FOUND: &str = "Image URL not found.";

/// Tunables for the enrichment pipeline.
#[derive(Debug, Clone)]
pub struct EnrichmentOptions {
    /// Deadline for each stage, retries included.
    pub stage_timeout: Duration,
    /// Reject anything other than JPEG and PNG before describing it.
    pub restrict_media_types: bool,
    /// Minimum entity confidence.
    pub entity_threshold: f32,
}

impl Default for EnrichmentOptions {
    fn default() -> Self {
        Self {
            stage_timeout: Duration::from_secs(SERVICE_TIMEOUT_SECS),
            restrict_media_types: true,
            entity_threshold: ENTITY_THRESHOLD,
        }
    }
}

/// Enriches image records with labels, description, entities and embedding.
pub struct EnrichmentService {
    repo: Arc<dyn ImageRepository>,
    labels: Arc<dyn LabelBackend>,
    vision: Arc<dyn VisionBackend>,
    embeddings: Arc<dyn EmbeddingBackend>,
    fetcher: Arc<dyn ImageFetcher>,
    ner: Option<Arc<dyn NerBackend>>,
    options: EnrichmentOptions,
}

impl EnrichmentService {
    pub fn new(
        repo: Arc<dyn ImageRepository>,
        labels: Arc<dyn LabelBackend>,
        vision: Arc<dyn VisionBackend>,
        embeddings: Arc<dyn EmbeddingBackend>,
        fetcher: Arc<dyn ImageFetcher>,
    ) -> Self {
        Self {
            repo,
            labels,
            vision,
            embeddings,
            fetcher,
            ner: None,
            options: EnrichmentOptions::default(),
        }
    }

    /// Enable the entity extraction stage.
    pub fn with_ner(mut self, ner: Arc<dyn NerBackend>) -> Self {
        self.ner = Some(ner);
        self
    }

    pub fn with_options(mut self, options: EnrichmentOptions) -> Self {
        self.options = options;
        self
    }

    /// Run the full pipeline for `image_id` and persist the result.
    ///
    /// A missing record or empty URL fails with `NotFound` before any
    /// external service is called. Nothing is written unless every required
    /// stage succeeds.
    pub async fn enrich(&self, image_id: &str) -> Result<EnrichmentResult> {
        let start = Instant::now();
        let image_id = image_id.trim();
        if image_id.is_empty() {
            return Err(Error::InvalidRequest("Image ID is required.".to_string()));
        }

        let record = self.repo.get(image_id).await?;
        let url = record
            .as_ref()
            .and_then(|r| r.enrichable_url())
            .map(str::to_string)
            .ok_or_else(|| Error::NotFound(IMAGE_URL_NOT_FOUND.to_string()))?;

        if self.options.restrict_media_types {
            if let Some(media_type) = media_type_from_url(&url) {
                ensure_supported(&media_type)?;
            }
        }

        debug!(
            subsystem = "api",
            component = "enrichment",
            op = "start",
            image_id = %image_id,
            "Enriching image"
        );

        let (labels, description) = tokio::join!(
            self.staged(Stage::LabelDetection, self.labels.detect_labels(&url)),
            self.staged(Stage::Description, self.describe(&url)),
        );
        let labels = labels?;
        let description = description?;

        let (entities, embedding) = tokio::join!(
            self.extract_entities(&description),
            self.staged(Stage::Embedding, self.embed(&description)),
        );
        let embedding = embedding?;

        let result = EnrichmentResult {
            labels,
            entities,
            description,
            embedding,
        };
        let tags = result.tags();

        self.repo
            .save_enrichment(image_id, &tags, &result.description, &result.embedding)
            .await
            .map_err(|e| match e {
                Error::Persistence(_) => e,
                other => Error::Persistence(other.to_string()),
            })?;

        info!(
            subsystem = "api",
            component = "enrichment",
            op = "complete",
            image_id = %image_id,
            label_count = result.labels.len(),
            entity_count = result.entities.len(),
            tag_count = tags.len(),
            description_len = result.description.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Image enriched"
        );
        Ok(result)
    }

    async fn describe(&self, url: &str) -> Result<String> {
        let image = self.fetcher.fetch(url).await?;
        if self.options.restrict_media_types {
            ensure_supported(&ImageMediaType::from_mime(&image.mime_type))?;
        }
        self.vision.describe_image(&image, DESCRIBE_IMAGE_PROMPT).await
    }

    async fn embed(&self, text: &str) -> Result<Vector> {
        self.embeddings
            .embed_texts(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Internal("embedding service returned no vector".to_string()))
    }

    /// Entity surface forms from the description. Optional stage: a failure
    /// is logged and yields no entities.
    async fn extract_entities(&self, description: &str) -> Vec<String> {
        let Some(ner) = self.ner.as_ref() else {
            return Vec::new();
        };

        let threshold = self.options.entity_threshold;
        let extracted = self
            .staged(
                Stage::EntityExtraction,
                ner.extract(description, ENTITY_TYPES, Some(threshold)),
            )
            .await;

        match extracted {
            Ok(entities) => entities
                .into_iter()
                .filter(|e| e.score >= threshold)
                .map(|e| e.text)
                .collect(),
            Err(e) => {
                warn!(
                    subsystem = "api",
                    component = "enrichment",
                    stage = Stage::EntityExtraction.as_str(),
                    error = %e,
                    "Continuing without entity tags"
                );
                Vec::new()
            }
        }
    }

    /// Apply the stage deadline and attribute any failure to `stage`.
    async fn staged<T, F>(&self, stage: Stage, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let start = Instant::now();
        let timeout = self.options.stage_timeout;
        let result = match tokio::time::timeout(timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(format!(
                "no response within {}s",
                timeout.as_secs_f32()
            ))),
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => debug!(
                subsystem = "api",
                component = "enrichment",
                stage = stage.as_str(),
                duration_ms,
                "Stage complete"
            ),
            Err(e) => warn!(
                subsystem = "api",
                component = "enrichment",
                stage = stage.as_str(),
                duration_ms,
                error = %e,
                "Stage failed"
            ),
        }

        result.map_err(|e| e.at_stage(stage))
    }
}

fn ensure_supported(media_type: &ImageMediaType) -> Result<()> {
    if media_type.is_supported() {
        Ok(())
    } else {
        Err(Error::UnsupportedMediaType(format!(
            "{} is not supported; only image/jpeg and image/png can be described",
            media_type
        )))
    }
}
