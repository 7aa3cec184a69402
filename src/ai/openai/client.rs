use super::types::{ChatCompletionRequest, ChatCompletionResponse};
use crate::{Error, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Thin Azure OpenAI REST client shared by the chat and image modules.
pub struct OpenAiHttpClient {
    client: Client,
    api_key: String,
    base_url: String,
    api_version: String,
    timeout: Duration,
}

impl OpenAiHttpClient {
    pub fn new(api_key: String, base_url: String, api_version: String, timeout: Duration) -> Self {
        Self::new_with_client(api_key, base_url, api_version, timeout, Client::new())
    }

    pub fn new_with_client(
        api_key: String,
        base_url: String,
        api_version: String,
        timeout: Duration,
        client: Client,
    ) -> Self {
        Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_version,
            timeout,
        }
    }

    fn deployment_url(&self, deployment: &str, operation: &str) -> String {
        format!(
            "{}/openai/deployments/{}/{}",
            self.base_url, deployment, operation
        )
    }

    pub async fn post<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        deployment: &str,
        operation: &str,
        request: &Req,
    ) -> Result<Resp> {
        let url = self.deployment_url(deployment, operation);
        let response = self
            .client
            .post(&url)
            .timeout(self.timeout)
            .query(&[("api-version", &self.api_version)])
            .header("api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send request to Azure OpenAI: {}", e);
                e
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            tracing::error!(
                "Azure OpenAI API error (status {}): {}",
                status,
                error_text
            );
            return Err(Error::ProviderStatus {
                status: status.as_u16(),
                body: error_text,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse Azure OpenAI response: {}\nBody: {}", e, body);
            Error::Serialization(e)
        })
    }

    pub async fn chat_completion(
        &self,
        deployment: &str,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse> {
        self.post(deployment, "chat/completions", &request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> OpenAiHttpClient {
        OpenAiHttpClient::new(
            "test-key".to_string(),
            format!("{}/", server.uri()),
            "2024-02-01".to_string(),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_post_targets_deployment_with_key_and_version() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/openai/deployments/GPT-4/chat/completions"))
            .and(query_param("api-version", "2024-02-01"))
            .and(header("api-key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let body: Value = client_for(&server)
            .post("GPT-4", "chat/completions", &serde_json::json!({}))
            .await
            .unwrap();
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn test_post_non_success_returns_provider_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .post::<_, Value>("GPT-4", "chat/completions", &serde_json::json!({}))
            .await
            .unwrap_err();
        match err {
            Error::ProviderStatus { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "bad key");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_post_malformed_body_returns_serialization_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .chat_completion(
                "GPT-4",
                ChatCompletionRequest {
                    messages: vec![],
                    n: 1,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
