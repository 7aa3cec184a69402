use super::client::OpenAiHttpClient;
use super::types::{ErrorEnvelope, ImageGenerationRequest, ImageGenerationResponse};
use crate::ai::mime;
use crate::models::ImageResult;
use crate::Error;

/// Generate one image and fold every failure into [`ImageResult::Failed`].
pub async fn generate_image(
    http: &OpenAiHttpClient,
    deployment: &str,
    description: &str,
) -> ImageResult {
    let request = ImageGenerationRequest {
        prompt: description.to_string(),
        n: 1,
        size: "1024x1024".to_string(),
    };

    match http
        .post::<_, ImageGenerationResponse>(deployment, "images/generations", &request)
        .await
    {
        Ok(response) => from_response(response),
        Err(e) => from_error(e),
    }
}

/// Only the first location decides the outcome; any further ones are ignored.
fn from_response(response: ImageGenerationResponse) -> ImageResult {
    let Some(location) = response.data.into_iter().next() else {
        tracing::error!("Image generation returned no image locations");
        return ImageResult::failed("empty_response", "Provider returned no image locations");
    };

    if let Some(error) = location.error {
        let code = error.code.unwrap_or_else(|| "unknown".to_string());
        let message = error.message.unwrap_or_default();
        tracing::error!(
            "Image generation operation failed. Error code: {}, error message: {}",
            code,
            message
        );
        return ImageResult::failed(code, message);
    }

    if let Some(revised) = &location.revised_prompt {
        tracing::debug!("Provider revised image prompt to: {}", revised);
    }

    if let Some(url) = location.url {
        ImageResult::Url(url)
    } else if let Some(b64_json) = location.b64_json {
        match mime::data_url_from_b64(&b64_json) {
            Ok(data_url) => ImageResult::Url(data_url),
            Err(e) => {
                tracing::error!("Failed to decode base64 image: {}", e);
                ImageResult::failed("invalid_image_data", e.to_string())
            }
        }
    } else {
        tracing::error!("Image location carried neither a URL nor inline data");
        ImageResult::failed(
            "empty_response",
            "No image data (neither base64 nor URL) in response",
        )
    }
}

fn from_error(err: Error) -> ImageResult {
    match err {
        Error::ProviderStatus { status, body } => {
            match serde_json::from_str::<ErrorEnvelope>(&body) {
                Ok(envelope) => ImageResult::failed(
                    envelope
                        .error
                        .code
                        .unwrap_or_else(|| format!("http_{}", status)),
                    envelope.error.message.unwrap_or(body),
                ),
                Err(_) => ImageResult::failed(format!("http_{}", status), body),
            }
        }
        other => {
            tracing::error!("Image generation request failed: {}", other);
            ImageResult::failed("request_failed", other.to_string())
        }
    }
}
