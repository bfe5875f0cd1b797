//! OpenAI-compatible client for embeddings and chat completions.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use ragpipe_core::config::OpenAiSettings;
use ragpipe_core::error::ProviderError;
use ragpipe_core::traits::{AnswerGenerator, EmbeddingProvider};

use crate::prompts::PromptSet;

/// Async client that talks to OpenAI-compatible `/embeddings` and
/// `/chat/completions` endpoints.
///
/// Transient failures (429, 5xx, connect/timeout errors) are retried with a
/// capped exponential backoff up to `max_retries` attempts in total.
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    model: String,
    embed_model: String,
    model_id: String,
    dimension: usize,
    temperature: f32,
    max_retries: usize,
    prompts: PromptSet,
}

impl OpenAiClient {
    /// Builds a new client producing vectors of `dimension` length.
    pub fn new(
        settings: &OpenAiSettings,
        dimension: usize,
        prompts: PromptSet,
    ) -> Result<Self, ProviderError> {
        let api_key = settings.api_key.trim();
        if api_key.is_empty() {
            return Err(ProviderError::Request("missing OpenAI API key".to_string()));
        }
        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {api_key}");
        let auth = HeaderValue::from_str(&auth)
            .map_err(|_| ProviderError::Request("invalid OpenAI API key".to_string()))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs.max(1)))
            .default_headers(headers)
            .build()
            .map_err(|e| {
                ProviderError::Request(format!("failed to build OpenAI HTTP client: {e}"))
            })?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            embed_model: settings.embed_model.clone(),
            model_id: format!("openai:{}", settings.embed_model),
            dimension,
            temperature: settings.temperature,
            max_retries: settings.max_retries.max(1),
            prompts,
        })
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, ProviderError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned + Send,
    {
        let url = format!("{}/{}", self.base_url, path);
        let mut attempt = 0usize;
        loop {
            match self.client.post(&url).json(body).send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        return resp.json::<R>().await.map_err(|e| {
                            ProviderError::Request(format!("failed to parse {path} response: {e}"))
                        });
                    }
                    let body =
                        resp.text().await.unwrap_or_else(|_| "<body unavailable>".to_string());
                    if should_retry(status) && attempt + 1 < self.max_retries {
                        attempt += 1;
                        warn!(%status, attempt, path, "retrying OpenAI request");
                        tokio::time::sleep(retry_backoff(attempt)).await;
                        continue;
                    }
                    return Err(ProviderError::Status { status: status.as_u16(), body });
                }
                Err(err) => {
                    if (err.is_timeout() || err.is_connect()) && attempt + 1 < self.max_retries {
                        attempt += 1;
                        warn!(error = %err, attempt, path, "retrying OpenAI request");
                        tokio::time::sleep(retry_backoff(attempt)).await;
                        continue;
                    }
                    return Err(ProviderError::Request(err.to_string()));
                }
            }
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiClient {
    fn model_id(&self) -> &str { &self.model_id }

    fn dimension(&self) -> usize { self.dimension }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        let request = EmbeddingRequest {
            model: &self.embed_model,
            input: text,
            dimensions: requested_dimensions(&self.embed_model, self.dimension),
        };
        let response: EmbeddingResponse = self.post_json("embeddings", &request).await?;
        let embedding = into_embedding(response, self.dimension)?;
        debug!(model = %self.embed_model, chars = text.len(), "embedded text");
        Ok(embedding)
    }
}

#[async_trait]
impl AnswerGenerator for OpenAiClient {
    async fn answer(&self, context: &str, question: &str) -> Result<String, ProviderError> {
        let user_prompt = self.prompts.render(context, question);
        let request = ChatRequest {
            model: &self.model,
            temperature: self.temperature,
            messages: vec![
                ChatMessage { role: "system", content: &self.prompts.system },
                ChatMessage { role: "user", content: &user_prompt },
            ],
        };
        let response: ChatResponse = self.post_json("chat/completions", &request).await?;
        into_answer(response)
    }
}

fn should_retry(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn retry_backoff(attempt: usize) -> Duration {
    let capped = attempt.min(5) as u32;
    Duration::from_millis(500 * (1 << capped))
}

/// Only the v3 embedding models accept a shortened output size.
fn requested_dimensions(model: &str, dimension: usize) -> Option<usize> {
    model.starts_with("text-embedding-3").then_some(dimension)
}

fn into_embedding(
    mut response: EmbeddingResponse,
    expected: usize,
) -> Result<Vec<f32>, ProviderError> {
    response.data.sort_by_key(|entry| entry.index);
    let embedding = response
        .data
        .into_iter()
        .next()
        .map(|entry| entry.embedding)
        .ok_or_else(|| ProviderError::EmptyResponse("no embedding data in response".to_string()))?;
    if embedding.len() != expected {
        return Err(ProviderError::DimensionMismatch { expected, actual: embedding.len() });
    }
    Ok(embedding)
}

fn into_answer(response: ChatResponse) -> Result<String, ProviderError> {
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content.unwrap_or_default())
        .ok_or_else(|| ProviderError::EmptyResponse("no choices in response".to_string()))
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    #[serde(default)]
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn embedding_request_omits_dimensions_for_legacy_models() {
        let model = "text-embedding-ada-002";
        let req = EmbeddingRequest {
            model,
            input: "hi",
            dimensions: requested_dimensions(model, 1536),
        };
        assert_eq!(serde_json::to_value(&req).unwrap(), json!({"model": model, "input": "hi"}));

        let model = "text-embedding-3-large";
        let req = EmbeddingRequest {
            model,
            input: "hi",
            dimensions: requested_dimensions(model, 3072),
        };
        assert_eq!(serde_json::to_value(&req).unwrap()["dimensions"], json!(3072));
    }

    #[test]
    fn embedding_response_is_checked_against_dimension() {
        let resp: EmbeddingResponse = serde_json::from_value(json!({
            "data": [{"embedding": [0.1, 0.2, 0.3], "index": 0}]
        }))
        .unwrap();
        assert_eq!(into_embedding(resp, 3).unwrap(), vec![0.1, 0.2, 0.3]);

        let resp: EmbeddingResponse = serde_json::from_value(json!({
            "data": [{"embedding": [0.1, 0.2], "index": 0}]
        }))
        .unwrap();
        assert!(matches!(
            into_embedding(resp, 3),
            Err(ProviderError::DimensionMismatch { expected: 3, actual: 2 })
        ));
    }

    #[test]
    fn empty_embedding_response_is_an_error() {
        let resp: EmbeddingResponse = serde_json::from_value(json!({"data": []})).unwrap();
        assert!(matches!(into_embedding(resp, 3), Err(ProviderError::EmptyResponse(_))));
    }

    #[test]
    fn chat_response_takes_first_choice() {
        let resp: ChatResponse = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": "forty-two"}}]
        }))
        .unwrap();
        assert_eq!(into_answer(resp).unwrap(), "forty-two");

        let resp: ChatResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        assert!(matches!(into_answer(resp), Err(ProviderError::EmptyResponse(_))));
    }

    #[test]
    fn backoff_is_capped() {
        assert_eq!(retry_backoff(1), Duration::from_millis(1000));
        assert_eq!(retry_backoff(5), retry_backoff(9));
        assert!(should_retry(StatusCode::TOO_MANY_REQUESTS));
        assert!(should_retry(StatusCode::BAD_GATEWAY));
        assert!(!should_retry(StatusCode::UNAUTHORIZED));
    }

    #[test]
    fn new_rejects_missing_key() {
        let settings = OpenAiSettings::default();
        assert!(OpenAiClient::new(&settings, 8, PromptSet::default()).is_err());
    }
}
