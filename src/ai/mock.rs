use super::ModelClient;
use crate::models::{Completion, ImageResult, PromptMessage};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone)]
enum TextResponse {
    Completions(Vec<String>),
    Failure(String),
    Panic,
}

/// Scriptable [`ModelClient`] for tests. Clones share state, so a clone can
/// be kept as an observer after the original is moved into the code under test.
#[derive(Clone)]
pub struct MockModelClient {
    text_response: Arc<Mutex<TextResponse>>,
    text_delay: Arc<Mutex<Option<Duration>>>,
    image_responses: Arc<Mutex<Vec<(String, ImageResult)>>>,
    image_delays: Arc<Mutex<Vec<(String, Duration)>>>,
    text_call_count: Arc<Mutex<usize>>,
    image_call_count: Arc<Mutex<usize>>,
    image_descriptions: Arc<Mutex<Vec<String>>>,
}

impl MockModelClient {
    pub fn new() -> Self {
        Self {
            text_response: Arc::new(Mutex::new(TextResponse::Completions(vec![
                "A mock animal had a quiet day.".to_string(),
            ]))),
            text_delay: Arc::new(Mutex::new(None)),
            image_responses: Arc::new(Mutex::new(Vec::new())),
            image_delays: Arc::new(Mutex::new(Vec::new())),
            text_call_count: Arc::new(Mutex::new(0)),
            image_call_count: Arc::new(Mutex::new(0)),
            image_descriptions: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_completions<S: Into<String>>(self, texts: impl IntoIterator<Item = S>) -> Self {
        *self.text_response.lock().unwrap() =
            TextResponse::Completions(texts.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_text_failure(self, message: &str) -> Self {
        *self.text_response.lock().unwrap() = TextResponse::Failure(message.to_string());
        self
    }

    /// Make `generate_text` panic, as a crashed pipeline task would.
    pub fn with_text_panic(self) -> Self {
        *self.text_response.lock().unwrap() = TextResponse::Panic;
        self
    }

    pub fn with_text_delay(self, delay: Duration) -> Self {
        *self.text_delay.lock().unwrap() = Some(delay);
        self
    }

    /// Return `result` for any description containing `needle`.
    pub fn with_image_for(self, needle: &str, result: ImageResult) -> Self {
        self.image_responses
            .lock()
            .unwrap()
            .push((needle.to_string(), result));
        self
    }

    /// Delay image calls whose description contains `needle`.
    pub fn with_image_delay(self, needle: &str, delay: Duration) -> Self {
        self.image_delays
            .lock()
            .unwrap()
            .push((needle.to_string(), delay));
        self
    }

    pub fn get_text_call_count(&self) -> usize {
        *self.text_call_count.lock().unwrap()
    }

    pub fn get_image_call_count(&self) -> usize {
        *self.image_call_count.lock().unwrap()
    }

    pub fn get_call_count(&self) -> usize {
        self.get_text_call_count() + self.get_image_call_count()
    }

    pub fn get_image_descriptions(&self) -> Vec<String> {
        self.image_descriptions.lock().unwrap().clone()
    }
}

impl Default for MockModelClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelClient for MockModelClient {
    async fn generate_text(&self, _messages: &[PromptMessage]) -> Result<Vec<Completion>> {
        *self.text_call_count.lock().unwrap() += 1;

        let delay = *self.text_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let response = self.text_response.lock().unwrap().clone();
        match response {
            TextResponse::Completions(texts) => Ok(texts.into_iter().map(Completion::new).collect()),
            TextResponse::Failure(message) => Err(Error::AiProvider(message)),
            TextResponse::Panic => panic!("mock text generation panicked"),
        }
    }

    async fn generate_image(&self, description: &str) -> ImageResult {
        let call_number = {
            let mut count = self.image_call_count.lock().unwrap();
            *count += 1;
            *count
        };
        self.image_descriptions
            .lock()
            .unwrap()
            .push(description.to_string());

        let delay = self
            .image_delays
            .lock()
            .unwrap()
            .iter()
            .find(|(needle, _)| description.contains(needle.as_str()))
            .map(|(_, delay)| *delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self
            .image_responses
            .lock()
            .unwrap()
            .iter()
            .find(|(needle, _)| description.contains(needle.as_str()))
            .map(|(_, result)| result.clone());

        scripted.unwrap_or_else(|| {
            ImageResult::Url(format!(
                "https://mock-images.example.com/{}.png",
                call_number
            ))
        })
    }
}
