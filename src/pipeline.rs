//! Story-then-images orchestration.
//!
//! One text-generation call produces a list of stories; each story is then
//! illustrated by its own image call. Image calls run concurrently but are
//! merged back in story order, and an image failure only affects its own
//! story.

use crate::ai::ModelClient;
use crate::models::{ImageResult, PipelineResult, StoryItem};
use crate::{prompts, Error, Result};
use futures::stream::{self, StreamExt};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub struct StoryImagePipeline {
    client: Arc<dyn ModelClient>,
    call_timeout: Duration,
    max_concurrent_images: usize,
}

impl StoryImagePipeline {
    pub fn new(
        client: Arc<dyn ModelClient>,
        call_timeout: Duration,
        max_concurrent_images: usize,
    ) -> Self {
        Self {
            client,
            call_timeout,
            max_concurrent_images: max_concurrent_images.max(1),
        }
    }

    /// Generate stories about `subject` and one image per story.
    ///
    /// Fails only when text generation fails, times out, or `cancel` fires.
    pub async fn run(&self, subject: &str, cancel: &CancellationToken) -> Result<PipelineResult> {
        let messages = prompts::story_messages(subject);
        let completions = self
            .bounded(cancel, self.client.generate_text(&messages))
            .await??;
        info!(
            "Text generation returned {} completion(s) for '{}'",
            completions.len(),
            subject
        );

        let descriptions: Vec<String> = completions
            .iter()
            .map(|completion| prompts::image_description(&completion.text))
            .collect();
        let images: Vec<ImageResult> = stream::iter(descriptions.into_iter().enumerate())
            .map(|(index, description)| self.illustrate(index, description, cancel))
            .buffered(self.max_concurrent_images)
            .collect()
            .await;

        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let result = PipelineResult {
            items: completions
                .into_iter()
                .zip(images)
                .map(|(completion, image)| StoryItem { completion, image })
                .collect(),
        };

        if result.failed_images() > 0 {
            warn!(
                "{} of {} image(s) failed for '{}'",
                result.failed_images(),
                result.len(),
                subject
            );
        }
        Ok(result)
    }

    async fn illustrate(
        &self,
        index: usize,
        description: String,
        cancel: &CancellationToken,
    ) -> ImageResult {
        match self
            .bounded(cancel, self.client.generate_image(&description))
            .await
        {
            Ok(ImageResult::Failed(failure)) => {
                warn!(
                    "Image {} failed. Error code: {}, error message: {}",
                    index, failure.code, failure.message
                );
                ImageResult::Failed(failure)
            }
            Ok(image) => image,
            Err(e) => {
                warn!("Image {} aborted: {}", index, e);
                match e {
                    Error::Timeout(_) => ImageResult::failed("timeout", e.to_string()),
                    _ => ImageResult::failed("cancelled", e.to_string()),
                }
            }
        }
    }

    /// Race `fut` against the per-call timeout and the request's cancellation.
    async fn bounded<F: Future>(&self, cancel: &CancellationToken, fut: F) -> Result<F::Output> {
        tokio::select! {
            _ = cancel.cancelled() => Err(Error::Cancelled),
            output = tokio::time::timeout(self.call_timeout, fut) => {
                output.map_err(|_| Error::Timeout(self.call_timeout))
            }
        }
    }
}
