pub mod chat;
pub mod client;
pub mod image;
pub mod types;

use crate::ai::ModelClient;
use crate::models::{Completion, Config, ImageResult, PromptMessage};
use crate::Result;
use async_trait::async_trait;
use client::OpenAiHttpClient;

/// [`ModelClient`] backed by an Azure OpenAI resource with one chat
/// deployment and one image deployment.
pub struct OpenAiModelClient {
    http: OpenAiHttpClient,
    chat_deployment: String,
    image_deployment: String,
    completion_count: u32,
}

impl OpenAiModelClient {
    pub fn new(
        http: OpenAiHttpClient,
        chat_deployment: String,
        image_deployment: String,
        completion_count: u32,
    ) -> Self {
        Self {
            http,
            chat_deployment,
            image_deployment,
            completion_count,
        }
    }

    pub fn from_config(config: &Config, client: reqwest::Client) -> Self {
        let http = OpenAiHttpClient::new_with_client(
            config.api_key.clone(),
            config.endpoint.clone(),
            config.api_version.clone(),
            config.provider_timeout,
            client,
        );
        Self::new(
            http,
            config.chat_deployment.clone(),
            config.image_deployment.clone(),
            config.completion_count,
        )
    }
}

#[async_trait]
impl ModelClient for OpenAiModelClient {
    async fn generate_text(&self, messages: &[PromptMessage]) -> Result<Vec<Completion>> {
        chat::generate_completions(
            &self.http,
            &self.chat_deployment,
            self.completion_count,
            messages,
        )
        .await
    }

    async fn generate_image(&self, description: &str) -> ImageResult {
        image::generate_image(&self.http, &self.image_deployment, description).await
    }
}
