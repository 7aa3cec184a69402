use super::client::OpenAiHttpClient;
use super::types::{ChatCompletionRequest, ChatMessage};
use crate::models::{Completion, PromptMessage};
use crate::Result;

/// Request `n` completions and return them in provider order.
///
/// Choices without text content (content-filtered) become empty completions
/// so the result length always matches the number of choices.
pub async fn generate_completions(
    http: &OpenAiHttpClient,
    deployment: &str,
    n: u32,
    messages: &[PromptMessage],
) -> Result<Vec<Completion>> {
    let request = ChatCompletionRequest {
        messages: messages
            .iter()
            .map(|m| ChatMessage {
                role: m.role,
                content: Some(m.content.clone()),
            })
            .collect(),
        n,
    };

    tracing::debug!("Requesting {} completion(s) from deployment {}", n, deployment);
    let response = http.chat_completion(deployment, request).await?;

    let mut choices = response.choices;
    // Azure may return choices out of index order when n > 1.
    if choices.iter().all(|c| c.index.is_some()) {
        choices.sort_by_key(|c| c.index);
    }

    Ok(choices
        .into_iter()
        .map(|choice| {
            if choice.finish_reason.as_deref() == Some("content_filter") {
                tracing::warn!("Completion was filtered by the provider");
            }
            Completion::new(
                choice
                    .message
                    .and_then(|message| message.content)
                    .unwrap_or_default(),
            )
        })
        .collect())
}
