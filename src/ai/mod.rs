//! AI service integration for story and image generation
//!
//! Provides the [`ModelClient`] capability trait and its Azure OpenAI
//! implementation, plus a scriptable mock for tests.

pub mod mime;
pub mod mock;
pub mod openai;

pub use mock::MockModelClient;
pub use openai::OpenAiModelClient;

use crate::models::{Completion, ImageResult, PromptMessage};
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Generate text completions, in the order the provider returned them.
    async fn generate_text(&self, messages: &[PromptMessage]) -> Result<Vec<Completion>>;

    /// Generate one image. Provider failures are reported in the result,
    /// never as an error, so one bad image cannot abort a batch.
    async fn generate_image(&self, description: &str) -> ImageResult;
}
