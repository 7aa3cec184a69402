//! Data models and structures
//!
//! Defines the request, prompt, and pipeline result types shared between the
//! HTTP handler, the story pipeline, and the model clients, plus the
//! environment-driven service configuration.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Client-facing text for a missing or blank `animal` parameter.
pub const MISSING_ANIMAL_MESSAGE: &str = "Missing 'animal' parameter";

/// One validated inbound generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    subject: String,
}

impl GenerationRequest {
    /// Validate the raw `animal` query value.
    ///
    /// Absent, empty, and whitespace-only values are rejected.
    pub fn new(raw: Option<&str>) -> Result<Self> {
        match raw.map(str::trim) {
            Some(subject) if !subject.is_empty() => Ok(Self {
                subject: subject.to_string(),
            }),
            _ => Err(Error::Validation(MISSING_ANIMAL_MESSAGE.to_string())),
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Role-tagged message sent to the text-generation model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PromptMessage {
    pub role: Role,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
}

impl Completion {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFailure {
    pub code: String,
    pub message: String,
}

/// Outcome of one image-generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageResult {
    Url(String),
    Failed(ImageFailure),
}

impl ImageResult {
    pub fn failed(code: impl Into<String>, message: impl Into<String>) -> Self {
        ImageResult::Failed(ImageFailure {
            code: code.into(),
            message: message.into(),
        })
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            ImageResult::Url(url) => Some(url),
            ImageResult::Failed(_) => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ImageResult::Failed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryItem {
    pub completion: Completion,
    pub image: ImageResult,
}

/// Stories paired with their images, in the order the completions were returned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineResult {
    pub items: Vec<StoryItem>,
}

impl PipelineResult {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StoryItem> {
        self.items.iter()
    }

    pub fn failed_images(&self) -> usize {
        self.items.iter().filter(|item| item.image.is_failed()).count()
    }
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub endpoint: String,
    pub api_key: String,
    pub chat_deployment: String,
    pub image_deployment: String,
    pub api_version: String,
    pub completion_count: u32,
    pub provider_timeout: Duration,
    pub max_concurrent_images: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| Error::Config(format!("{} not set", key)))
        };
        let optional =
            |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let endpoint = required("AZURE_OPENAI_ENDPOINT")?;
        let parsed = url::Url::parse(&endpoint).map_err(|e| {
            Error::Config(format!("AZURE_OPENAI_ENDPOINT is not a valid URL: {}", e))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "AZURE_OPENAI_ENDPOINT must use http or https, got '{}'",
                parsed.scheme()
            )));
        }

        let completion_count: u32 = parse_number(
            "STORY_COMPLETION_COUNT",
            &optional("STORY_COMPLETION_COUNT", "1"),
        )?;
        if !(1..=10).contains(&completion_count) {
            return Err(Error::Config(format!(
                "STORY_COMPLETION_COUNT must be between 1 and 10, got {}",
                completion_count
            )));
        }

        let timeout_secs: u64 = parse_number(
            "PROVIDER_TIMEOUT_SECS",
            &optional("PROVIDER_TIMEOUT_SECS", "60"),
        )?;
        if timeout_secs == 0 {
            return Err(Error::Config(
                "PROVIDER_TIMEOUT_SECS must be greater than 0".to_string(),
            ));
        }

        let max_concurrent_images: usize = parse_number(
            "MAX_CONCURRENT_IMAGES",
            &optional("MAX_CONCURRENT_IMAGES", "4"),
        )?;
        if max_concurrent_images == 0 {
            return Err(Error::Config(
                "MAX_CONCURRENT_IMAGES must be greater than 0".to_string(),
            ));
        }

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: required("AZURE_OPENAI_KEY")?,
            chat_deployment: optional("AZURE_OPENAI_CHAT_DEPLOYMENT", "GPT-4"),
            image_deployment: optional("AZURE_OPENAI_IMAGE_DEPLOYMENT", "Dalle3"),
            api_version: optional("AZURE_OPENAI_API_VERSION", "2024-02-01"),
            completion_count,
            provider_timeout: Duration::from_secs(timeout_secs),
            max_concurrent_images,
        })
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{} must be a number, got '{}'", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("AZURE_OPENAI_ENDPOINT", "https://example.openai.azure.com/"),
        ("AZURE_OPENAI_KEY", "secret"),
    ];

    #[test]
    fn test_generation_request_trims_subject() {
        let request = GenerationRequest::new(Some("  panda ")).unwrap();
        assert_eq!(request.subject(), "panda");
    }

    #[test]
    fn test_generation_request_rejects_missing_and_blank() {
        for raw in [None, Some(""), Some("   ")] {
            let err = GenerationRequest::new(raw).unwrap_err();
            assert!(matches!(err, Error::Validation(_)));
        }
    }

    #[test]
    fn test_prompt_message_role_serializes_lowercase() {
        let json = serde_json::to_string(&PromptMessage::system("hi")).unwrap();
        assert_eq!(json, r#"{"role":"system","content":"hi"}"#);
    }

    #[test]
    fn test_pipeline_result_counts_failed_images() {
        let result = PipelineResult {
            items: vec![
                StoryItem {
                    completion: Completion::new("one"),
                    image: ImageResult::Url("https://img/1.png".to_string()),
                },
                StoryItem {
                    completion: Completion::new("two"),
                    image: ImageResult::failed("content_policy_violation", "blocked"),
                },
            ],
        };

        assert_eq!(result.len(), 2);
        assert_eq!(result.failed_images(), 1);
        assert_eq!(result.items[0].image.url(), Some("https://img/1.png"));
        assert_eq!(result.items[1].image.url(), None);
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::from_lookup(lookup_from(&REQUIRED)).unwrap();

        assert_eq!(config.endpoint, "https://example.openai.azure.com");
        assert_eq!(config.api_key, "secret");
        assert_eq!(config.chat_deployment, "GPT-4");
        assert_eq!(config.image_deployment, "Dalle3");
        assert_eq!(config.api_version, "2024-02-01");
        assert_eq!(config.completion_count, 1);
        assert_eq!(config.provider_timeout, Duration::from_secs(60));
        assert_eq!(config.max_concurrent_images, 4);
    }

    #[test]
    fn test_config_overrides() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([
            ("AZURE_OPENAI_CHAT_DEPLOYMENT", "gpt-4o"),
            ("STORY_COMPLETION_COUNT", "3"),
            ("PROVIDER_TIMEOUT_SECS", "15"),
            ("MAX_CONCURRENT_IMAGES", "2"),
        ]);
        let config = Config::from_lookup(lookup_from(&vars)).unwrap();

        assert_eq!(config.chat_deployment, "gpt-4o");
        assert_eq!(config.completion_count, 3);
        assert_eq!(config.provider_timeout, Duration::from_secs(15));
        assert_eq!(config.max_concurrent_images, 2);
    }

    #[test]
    fn test_config_requires_endpoint_and_key() {
        let err = Config::from_lookup(lookup_from(&[("AZURE_OPENAI_KEY", "secret")])).unwrap_err();
        assert!(err.to_string().contains("AZURE_OPENAI_ENDPOINT not set"));

        let err = Config::from_lookup(lookup_from(&[(
            "AZURE_OPENAI_ENDPOINT",
            "https://example.openai.azure.com",
        )]))
        .unwrap_err();
        assert!(err.to_string().contains("AZURE_OPENAI_KEY not set"));
    }

    #[test]
    fn test_config_rejects_invalid_endpoint() {
        let err = Config::from_lookup(lookup_from(&[
            ("AZURE_OPENAI_ENDPOINT", "not a url"),
            ("AZURE_OPENAI_KEY", "secret"),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = Config::from_lookup(lookup_from(&[
            ("AZURE_OPENAI_ENDPOINT", "ftp://example.com"),
            ("AZURE_OPENAI_KEY", "secret"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("http or https"));
    }

    #[test]
    fn test_config_rejects_out_of_range_numbers() {
        for (key, value) in [
            ("STORY_COMPLETION_COUNT", "0"),
            ("STORY_COMPLETION_COUNT", "11"),
            ("PROVIDER_TIMEOUT_SECS", "0"),
            ("MAX_CONCURRENT_IMAGES", "0"),
            ("MAX_CONCURRENT_IMAGES", "many"),
        ] {
            let mut vars = REQUIRED.to_vec();
            vars.push((key, value));
            let err = Config::from_lookup(lookup_from(&vars)).unwrap_err();
            assert!(err.to_string().contains(key), "{} = {}", key, value);
        }
    }
}
