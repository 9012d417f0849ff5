//! OpenAI LLM provider

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AiError, Result};
use crate::http_client::build_http_client;
use crate::llm::client::{
    CompletionRequest, CompletionResponse, FinishReason, LlmClient, Message, StreamChunk,
    StreamResult, TokenUsage,
};
use crate::llm::http_error::response_to_error;
use crate::llm::sse::{SseDecoder, SseEvent};

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI client
pub struct OpenAIClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAIClient {
    /// Create a new OpenAI client
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: build_http_client(),
            api_key: api_key.into(),
            model: DEFAULT_OPENAI_MODEL.to_string(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
        }
    }

    /// Set the model to use
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set custom base URL (for API-compatible services)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn build_body(&self, request: &CompletionRequest, stream: bool) -> OpenAIRequest {
        OpenAIRequest {
            model: self.model.clone(),
            messages: request.messages.iter().map(OpenAIMessage::from).collect(),
            temperature: request.temperature,
            stream,
            stream_options: stream.then_some(OpenAIStreamOptions {
                include_usage: true,
            }),
        }
    }
}

#[derive(Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream_options: Option<OpenAIStreamOptions>,
}

#[derive(Serialize)]
struct OpenAIStreamOptions {
    include_usage: bool,
}

#[derive(Serialize)]
struct OpenAIMessage {
    role: &'static str,
    content: String,
}

impl From<&Message> for OpenAIMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role.as_str(),
            content: message.content.clone(),
        }
    }
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

impl From<OpenAIUsage> for TokenUsage {
    fn from(usage: OpenAIUsage) -> Self {
        TokenUsage {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        }
    }
}

// Streaming types

#[derive(Deserialize, Debug)]
struct OpenAIStreamResponse {
    #[serde(default)]
    choices: Vec<OpenAIStreamChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Deserialize, Debug)]
struct OpenAIStreamChoice {
    #[serde(default)]
    delta: OpenAIStreamDelta,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
struct OpenAIStreamDelta {
    content: Option<String>,
}

/// Translate one SSE `data:` payload into zero or more stream chunks.
fn chunks_from_event(data: &str) -> Vec<StreamChunk> {
    let parsed: OpenAIStreamResponse = match serde_json::from_str(data) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::debug!(error = %e, "Skipping unparseable OpenAI stream event");
            return Vec::new();
        }
    };

    let mut chunks = Vec::new();
    for choice in parsed.choices {
        if let Some(content) = choice.delta.content
            && !content.is_empty()
        {
            chunks.push(StreamChunk::text(content));
        }

        if let Some(reason) = choice.finish_reason {
            chunks.push(StreamChunk::final_chunk(
                FinishReason::from_openai(&reason),
                None,
            ));
        }
    }

    // Usage arrives in its own event with an empty `choices` array.
    if let Some(usage) = parsed.usage {
        chunks.push(StreamChunk::final_chunk(
            FinishReason::Stop,
            Some(usage.into()),
        ));
    }

    chunks
}

#[async_trait]
impl LlmClient for OpenAIClient {
    fn provider(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let body = self.build_body(&request, false);
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(response_to_error(response, "OpenAI").await);
        }

        let data: OpenAIResponse = response.json().await?;
        let choice = data
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AiError::Llm("No response from OpenAI".to_string()))?;

        let finish_reason = choice
            .finish_reason
            .as_deref()
            .map(FinishReason::from_openai)
            .unwrap_or(FinishReason::Stop);

        Ok(CompletionResponse {
            content: choice.message.content,
            finish_reason,
            usage: data.usage.map(TokenUsage::from),
        })
    }

    fn complete_stream(&self, request: CompletionRequest) -> StreamResult {
        let client = self.client.clone();
        let api_key = self.api_key.clone();
        let endpoint = self.endpoint();
        let body = self.build_body(&request, true);
        let model = self.model.clone();

        Box::pin(async_stream::stream! {
            tracing::debug!(model = %model, "Opening OpenAI completion stream");

            let response = match client
                .post(endpoint)
                .bearer_auth(api_key)
                .json(&body)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(e) => {
                    yield Err(AiError::Llm(format!("Request failed: {}", e)));
                    return;
                }
            };

            if !response.status().is_success() {
                yield Err(response_to_error(response, "OpenAI").await);
                return;
            }

            let mut byte_stream = response.bytes_stream();
            let mut decoder = SseDecoder::new();

            while let Some(chunk_result) = byte_stream.next().await {
                let bytes = match chunk_result {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        yield Err(AiError::Llm(format!("Stream error: {}", e)));
                        return;
                    }
                };

                for event in decoder.push(&bytes) {
                    match event {
                        SseEvent::Done => return,
                        SseEvent::Data(data) => {
                            for chunk in chunks_from_event(&data) {
                                yield Ok(chunk);
                            }
                        }
                    }
                }
            }

            for event in decoder.finish() {
                if let SseEvent::Data(data) = event {
                    for chunk in chunks_from_event(&data) {
                        yield Ok(chunk);
                    }
                }
            }
        })
    }
}
