/// Model Client: the single point of entry for all chat-completion calls.
///
/// ARCHITECTURAL RULE: no other module may talk to the model endpoint
/// directly. All model traffic goes through the `ChatModel` trait, so the
/// pipeline can be exercised with instrumented fakes in tests.
///
/// Each invocation is a single attempt: failures are isolated per product by
/// the batch orchestrator, not retried here.
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

/// Sampling knobs sent with every completion request.
#[derive(Debug, Clone, Copy)]
pub struct SamplingParams {
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
}

impl SamplingParams {
    /// First-pass sampling: biased toward diverse, non-repetitive phrasing.
    pub fn first_pass(temperature: f32, max_tokens: u32) -> Self {
        Self {
            temperature,
            max_tokens,
            top_p: 0.9,
            frequency_penalty: 0.3,
            presence_penalty: 0.2,
        }
    }

    /// Self-check sampling: cooler temperature, lighter penalties; the
    /// model is auditing an existing set, not exploring.
    pub fn refinement(temperature: f32, max_tokens: u32) -> Self {
        Self {
            temperature: temperature.min(0.7),
            max_tokens,
            top_p: 0.9,
            frequency_penalty: 0.2,
            presence_penalty: 0.1,
        }
    }
}

/// Chat-completion response shape. Zero choices or a missing message/content
/// is a valid non-error outcome meaning "no usable output".
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    #[serde(default)]
    pub message: Option<ChatMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatResponse {
    /// Content of the first choice, if the model produced any.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.message.as_ref())
            .and_then(|message| message.content.as_deref())
    }
}

/// An opaque asynchronous chat-completion capability.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        params: &SamplingParams,
    ) -> Result<ChatResponse, ModelError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatRequestMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    frequency_penalty: f32,
    presence_penalty: f32,
}

#[derive(Debug, Serialize)]
struct ChatRequestMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// `ChatModel` implementation for OpenAI-compatible chat endpoints.
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(api_url: String, api_key: String, model: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("Failed to build HTTP client"),
            api_url,
            api_key,
            model,
        }
    }
}

#[async_trait]
impl ChatModel for OpenAiClient {
    async fn complete(
        &self,
        system: &str,
        user: &str,
        params: &SamplingParams,
    ) -> Result<ChatResponse, ModelError> {
        let request_body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatRequestMessage {
                    role: "system",
                    content: system,
                },
                ChatRequestMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: params.temperature,
            max_tokens: params.max_tokens,
            top_p: params.top_p,
            frequency_penalty: params.frequency_penalty,
            presence_penalty: params.presence_penalty,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(ModelError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let chat_response: ChatResponse = response.json().await?;
        debug!(
            choices = chat_response.choices.len(),
            "Chat completion succeeded"
        );
        Ok(chat_response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_returns_first_choice_content() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"content":"hello"}},{"message":{"content":"second"}}]}"#,
        )
        .unwrap();
        assert_eq!(response.text(), Some("hello"));
    }

    #[test]
    fn test_text_none_when_no_choices() {
        let response: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert_eq!(response.text(), None);
    }

    #[test]
    fn test_text_none_when_message_or_content_missing() {
        let no_message: ChatResponse = serde_json::from_str(r#"{"choices":[{}]}"#).unwrap();
        assert_eq!(no_message.text(), None);

        let no_content: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{}}]}"#).unwrap();
        assert_eq!(no_content.text(), None);
    }

    #[test]
    fn test_choices_default_when_field_absent() {
        let response: ChatResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(response.choices.is_empty());
    }

    #[test]
    fn test_refinement_params_clamp_temperature() {
        let params = SamplingParams::refinement(1.2, 400);
        assert!((params.temperature - 0.7).abs() < f32::EPSILON);

        let cooler = SamplingParams::refinement(0.3, 400);
        assert!((cooler.temperature - 0.3).abs() < f32::EPSILON);
    }
}
