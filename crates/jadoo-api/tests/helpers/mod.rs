//! In-memory collaborators for service and router tests.
//!
//! Every fake counts its calls so tests can assert that a failing request
//! touched no external service.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;

use jadoo_api::{
    build_router, AppState, ChatService, EnrichmentOptions, EnrichmentService, SearchService,
};
use jadoo_core::{
    EmbeddingBackend, Error, ImageFetcher, ImageMatch, ImagePayload, ImageRecord,
    ImageRepository, LabelBackend, NerBackend, NerEntity, Result, TagSet, Vector, VisionBackend,
};

pub const JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];
pub const DIM: usize = 4;

fn service_error(message: &str) -> Error {
    Error::Upstream {
        status: 500,
        message: message.to_string(),
    }
}

// =============================================================================
// REPOSITORY
// =============================================================================

#[derive(Debug, Clone)]
pub struct SavedEnrichment {
    pub id: String,
    pub tags: TagSet,
    pub description: String,
    pub embedding: Vec<f32>,
}

#[derive(Default)]
pub struct InMemoryRepository {
    records: Mutex<HashMap<String, ImageRecord>>,
    pub saves: Mutex<Vec<SavedEnrichment>>,
    pub matches: Mutex<Vec<ImageMatch>>,
    pub last_search: Mutex<Option<(f64, i64)>>,
    pub fail_save: Mutex<Option<String>>,
    pub fail_search: Mutex<Option<String>>,
    pub get_calls: AtomicUsize,
}

impl InMemoryRepository {
    pub fn with_image(self, id: &str, url: &str) -> Self {
        self.records.lock().unwrap().insert(
            id.to_string(),
            ImageRecord {
                id: id.to_string(),
                url: url.to_string(),
                tags: TagSet::new(),
                description: None,
                embedding: None,
            },
        );
        self
    }

    pub fn save_count(&self) -> usize {
        self.saves.lock().unwrap().len()
    }

    pub fn last_save(&self) -> Option<SavedEnrichment> {
        self.saves.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ImageRepository for InMemoryRepository {
    async fn get(&self, id: &str) -> Result<Option<ImageRecord>> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.records.lock().unwrap().get(id).cloned())
    }

    async fn save_enrichment(
        &self,
        id: &str,
        tags: &TagSet,
        description: &str,
        embedding: &Vector,
    ) -> Result<()> {
        if let Some(msg) = self.fail_save.lock().unwrap().clone() {
            return Err(Error::Persistence(msg));
        }
        let mut records = self.records.lock().unwrap();
        let record = records
            .get_mut(id)
            .ok_or_else(|| Error::Persistence(format!("no image row matched id {}", id)))?;
        record.tags = tags.clone();
        record.description = Some(description.to_string());
        record.embedding = Some(embedding.clone());
        self.saves.lock().unwrap().push(SavedEnrichment {
            id: id.to_string(),
            tags: tags.clone(),
            description: description.to_string(),
            embedding: embedding.to_vec(),
        });
        Ok(())
    }

    async fn match_images(
        &self,
        _embedding: &Vector,
        threshold: f64,
        limit: i64,
    ) -> Result<Vec<ImageMatch>> {
        *self.last_search.lock().unwrap() = Some((threshold, limit));
        if let Some(msg) = self.fail_search.lock().unwrap().clone() {
            return Err(Error::Internal(msg));
        }
        let matches = self.matches.lock().unwrap();
        Ok(matches.iter().take(limit as usize).cloned().collect())
    }
}

// =============================================================================
// SERVICES
// =============================================================================

#[derive(Default)]
pub struct FakeLabels {
    pub labels: Mutex<Vec<String>>,
    pub fail: Mutex<Option<String>>,
    pub delay: Mutex<Option<Duration>>,
    pub calls: AtomicUsize,
    pub last_url: Mutex<Option<String>>,
}

impl FakeLabels {
    pub fn returning(labels: &[&str]) -> Self {
        let fake = Self::default();
        *fake.labels.lock().unwrap() = labels.iter().map(|s| s.to_string()).collect();
        fake
    }
}

#[async_trait]
impl LabelBackend for FakeLabels {
    async fn detect_labels(&self, image_url: &str) -> Result<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_url.lock().unwrap() = Some(image_url.to_string());
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(msg) = self.fail.lock().unwrap().clone() {
            return Err(service_error(&msg));
        }
        Ok(self.labels.lock().unwrap().clone())
    }
}

#[derive(Default)]
pub struct FakeVision {
    pub reply: Mutex<String>,
    pub fail: Mutex<Option<String>>,
    pub calls: AtomicUsize,
    pub last_prompt: Mutex<Option<String>>,
    pub last_mime: Mutex<Option<String>>,
}

impl FakeVision {
    pub fn replying(reply: &str) -> Self {
        let fake = Self::default();
        *fake.reply.lock().unwrap() = reply.to_string();
        fake
    }
}

#[async_trait]
impl VisionBackend for FakeVision {
    async fn describe_image(&self, image: &ImagePayload, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
        *self.last_mime.lock().unwrap() = Some(image.mime_type.clone());
        if let Some(msg) = self.fail.lock().unwrap().clone() {
            return Err(service_error(&msg));
        }
        Ok(self.reply.lock().unwrap().clone())
    }

    fn model_name(&self) -> &str {
        "fake-vision"
    }
}

#[derive(Default)]
pub struct FakeEmbeddings {
    pub fail: Mutex<Option<String>>,
    pub calls: AtomicUsize,
    pub last_texts: Mutex<Vec<String>>,
}

#[async_trait]
impl EmbeddingBackend for FakeEmbeddings {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_texts.lock().unwrap() = texts.to_vec();
        if let Some(msg) = self.fail.lock().unwrap().clone() {
            return Err(service_error(&msg));
        }
        Ok(texts
            .iter()
            .map(|t| {
                let mut v = vec![0.0f32; DIM];
                v[t.len() % DIM] = 1.0;
                Vector::from(v)
            })
            .collect())
    }

    fn dimension(&self) -> usize {
        DIM
    }

    fn model_name(&self) -> &str {
        "fake-embed"
    }
}

pub struct FakeFetcher {
    pub payload: Mutex<ImagePayload>,
    pub fail: Mutex<Option<String>>,
    pub calls: AtomicUsize,
}

impl Default for FakeFetcher {
    fn default() -> Self {
        Self {
            payload: Mutex::new(ImagePayload {
                data: JPEG_BYTES.to_vec(),
                mime_type: "image/jpeg".to_string(),
            }),
            fail: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ImageFetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<ImagePayload> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(msg) = self.fail.lock().unwrap().clone() {
            return Err(Error::Fetch(format!("GET {} failed: {}", url, msg)));
        }
        Ok(self.payload.lock().unwrap().clone())
    }
}

#[derive(Default)]
pub struct FakeNer {
    pub entities: Mutex<Vec<NerEntity>>,
    pub fail: Mutex<Option<String>>,
    pub calls: AtomicUsize,
}

impl FakeNer {
    pub fn returning(entities: &[(&str, &str, f32)]) -> Self {
        let fake = Self::default();
        *fake.entities.lock().unwrap() = entities
            .iter()
            .map(|(text, label, score)| NerEntity {
                text: text.to_string(),
                label: label.to_string(),
                score: *score,
                start: 0,
                end: text.len(),
            })
            .collect();
        fake
    }
}

#[async_trait]
impl NerBackend for FakeNer {
    async fn extract(
        &self,
        _text: &str,
        _entity_types: &[&str],
        _threshold: Option<f32>,
    ) -> Result<Vec<NerEntity>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(msg) = self.fail.lock().unwrap().clone() {
            return Err(service_error(&msg));
        }
        Ok(self.entities.lock().unwrap().clone())
    }

    fn model_name(&self) -> &str {
        "fake-ner"
    }
}

// =============================================================================
// HARNESS
// =============================================================================

/// All fakes plus the services built on them.
pub struct Harness {
    pub repo: Arc<InMemoryRepository>,
    pub labels: Arc<FakeLabels>,
    pub vision: Arc<FakeVision>,
    pub embeddings: Arc<FakeEmbeddings>,
    pub fetcher: Arc<FakeFetcher>,
    pub ner: Option<Arc<FakeNer>>,
    pub options: EnrichmentOptions,
}

impl Harness {
    pub fn new(repo: InMemoryRepository) -> Self {
        Self {
            repo: Arc::new(repo),
            labels: Arc::new(FakeLabels::default()),
            vision: Arc::new(FakeVision::default()),
            embeddings: Arc::new(FakeEmbeddings::default()),
            fetcher: Arc::new(FakeFetcher::default()),
            ner: None,
            options: EnrichmentOptions::default(),
        }
    }

    pub fn labels(mut self, labels: FakeLabels) -> Self {
        self.labels = Arc::new(labels);
        self
    }

    pub fn vision(mut self, vision: FakeVision) -> Self {
        self.vision = Arc::new(vision);
        self
    }

    pub fn ner(mut self, ner: FakeNer) -> Self {
        self.ner = Some(Arc::new(ner));
        self
    }

    pub fn options(mut self, options: EnrichmentOptions) -> Self {
        self.options = options;
        self
    }

    pub fn enrichment(&self) -> EnrichmentService {
        let service = EnrichmentService::new(
            self.repo.clone(),
            self.labels.clone(),
            self.vision.clone(),
            self.embeddings.clone(),
            self.fetcher.clone(),
        )
        .with_options(self.options.clone());
        match &self.ner {
            Some(ner) => service.with_ner(ner.clone()),
            None => service,
        }
    }

    pub fn search(&self) -> SearchService {
        SearchService::new(self.repo.clone(), self.embeddings.clone())
    }

    pub fn chat(&self) -> ChatService {
        ChatService::new(self.fetcher.clone(), self.vision.clone())
    }

    pub fn router(&self) -> Router {
        let state = AppState {
            enrichment: Arc::new(self.enrichment()),
            search: Arc::new(self.search()),
            chat: Arc::new(self.chat()),
        };
        build_router(state, vec!["http://localhost:3000".parse().unwrap()])
    }

    /// Calls made to any external service (labels, vision, embeddings,
    /// fetcher, entity extraction).
    pub fn external_calls(&self) -> usize {
        self.labels.calls.load(Ordering::SeqCst)
            + self.vision.calls.load(Ordering::SeqCst)
            + self.embeddings.calls.load(Ordering::SeqCst)
            + self.fetcher.calls.load(Ordering::SeqCst)
            + self
                .ner
                .as_ref()
                .map(|n| n.calls.load(Ordering::SeqCst))
                .unwrap_or(0)
    }
}
