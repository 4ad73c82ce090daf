//! Stateless visual question answering.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use jadoo_core::defaults::SERVICE_TIMEOUT_SECS;
use jadoo_core::{build_question_prompt, Error, ImageFetcher, Result, Stage, VisionBackend};

/// Answers questions about an image.
///
/// Every call downloads the image and builds its request from scratch; no
/// conversation state is kept between calls.
pub struct ChatService {
    fetcher: Arc<dyn ImageFetcher>,
    vision: Arc<dyn VisionBackend>,
    timeout: Duration,
}

impl ChatService {
    pub fn new(fetcher: Arc<dyn ImageFetcher>, vision: Arc<dyn VisionBackend>) -> Self {
        Self {
            fetcher,
            vision,
            timeout: Duration::from_secs(SERVICE_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Ask `question` about the image at `image_url`, with optional context.
    ///
    /// Returns the model's first text segment unchanged.
    pub async fn ask(&self, question: &str, image_url: &str, context: &str) -> Result<String> {
        let start = Instant::now();
        if question.trim().is_empty() {
            return Err(Error::InvalidRequest("content is required.".to_string()));
        }
        if image_url.trim().is_empty() {
            return Err(Error::InvalidRequest("image_url is required.".to_string()));
        }

        let image = tokio::time::timeout(self.timeout, self.fetcher.fetch(image_url.trim()))
            .await
            .map_err(|_| Error::Fetch(format!("image download exceeded {}s", self.timeout.as_secs())))?
            .map_err(|e| match e {
                Error::Fetch(_) => e,
                other => Error::Fetch(other.to_string()),
            })?;

        let prompt = build_question_prompt(question, context);
        let reply = tokio::time::timeout(self.timeout, self.vision.describe_image(&image, &prompt))
            .await
            .map_err(|_| Error::Timeout(format!("no answer within {}s", self.timeout.as_secs())))
            .and_then(|r| r)
            .map_err(|e| e.at_stage(Stage::Description))?;

        debug!(
            subsystem = "api",
            component = "chat",
            op = "ask",
            model = %self.vision.model_name(),
            has_context = !context.is_empty(),
            image_bytes = image.data.len(),
            reply_len = reply.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Question answered"
        );
        Ok(reply)
    }
}
