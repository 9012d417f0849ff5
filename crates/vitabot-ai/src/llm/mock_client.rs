//! Deterministic mock LLM client for endpoint and pipeline tests.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{AiError, Result};

use super::{
    CompletionRequest, CompletionResponse, FinishReason, LlmClient, StreamChunk, StreamResult,
    TokenUsage,
};

/// Scripted outcome of one mock completion.
#[derive(Debug, Clone)]
pub enum MockStep {
    /// Stream the given fragments, in order, then finish.
    Fragments(Vec<String>),
    /// Fail before producing anything.
    Error(String),
    /// Stream the given fragments, then fail mid-stream.
    Interrupted {
        fragments: Vec<String>,
        message: String,
    },
}

impl MockStep {
    pub fn text(content: impl Into<String>) -> Self {
        Self::fragments([content.into()])
    }

    pub fn fragments<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Fragments(fragments.into_iter().map(Into::into).collect())
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(message.into())
    }

    pub fn interrupted<I, S>(fragments: I, message: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Interrupted {
            fragments: fragments.into_iter().map(Into::into).collect(),
            message: message.into(),
        }
    }
}

/// A deterministic mock LLM client driven by scripted steps.
///
/// Every request it receives is recorded so tests can inspect the rendered
/// prompt or assert that the model was never called.
#[derive(Debug, Clone, Default)]
pub struct MockLlmClient {
    model: String,
    script: Arc<Mutex<VecDeque<MockStep>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockLlmClient {
    pub fn new(model: impl Into<String>) -> Self {
        Self::from_steps(model, Vec::new())
    }

    pub fn from_steps(model: impl Into<String>, steps: Vec<MockStep>) -> Self {
        Self {
            model: model.into(),
            script: Arc::new(Mutex::new(VecDeque::from(steps))),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Requests received so far, oldest first.
    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }

    async fn next_step(&self, request: &CompletionRequest) -> MockStep {
        self.requests.lock().await.push(request.clone());
        let step = self.script.lock().await.pop_front();
        step.unwrap_or_else(|| Self::fallback_step(request))
    }

    fn usage_for(content_len: usize) -> TokenUsage {
        let completion_tokens = content_len as u32;
        TokenUsage {
            prompt_tokens: 1,
            completion_tokens,
            total_tokens: 1 + completion_tokens,
        }
    }

    fn fallback_step(request: &CompletionRequest) -> MockStep {
        let text = request
            .messages
            .last()
            .map(|msg| format!("mock-echo: {}", msg.content))
            .unwrap_or_else(|| "mock-ok".to_string());
        MockStep::text(text)
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    fn provider(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        match self.next_step(&request).await {
            MockStep::Fragments(fragments) => {
                let content = fragments.concat();
                Ok(CompletionResponse {
                    usage: Some(Self::usage_for(content.len())),
                    content: Some(content),
                    finish_reason: FinishReason::Stop,
                })
            }
            MockStep::Error(message) | MockStep::Interrupted { message, .. } => {
                Err(AiError::Llm(message))
            }
        }
    }

    fn complete_stream(&self, request: CompletionRequest) -> StreamResult {
        let client = self.clone();
        Box::pin(async_stream::stream! {
            match client.next_step(&request).await {
                MockStep::Fragments(fragments) => {
                    let mut total = 0;
                    for fragment in fragments {
                        total += fragment.len();
                        yield Ok(StreamChunk::text(fragment));
                    }
                    yield Ok(StreamChunk::final_chunk(
                        FinishReason::Stop,
                        Some(MockLlmClient::usage_for(total)),
                    ));
                }
                MockStep::Error(message) => {
                    yield Err(AiError::Llm(message));
                }
                MockStep::Interrupted { fragments, message } => {
                    for fragment in fragments {
                        yield Ok(StreamChunk::text(fragment));
                    }
                    yield Err(AiError::Llm(message));
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use futures::{StreamExt, TryStreamExt};

    use super::*;
    use crate::llm::Message;

    #[tokio::test]
    async fn mock_client_streams_fragments_in_order() {
        let client =
            MockLlmClient::from_steps("mock-model", vec![MockStep::fragments(["a", "b", "c"])]);

        let chunks = client
            .complete_stream(CompletionRequest::new(vec![Message::user("hi")]))
            .try_collect::<Vec<_>>()
            .await
            .expect("stream should succeed");

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b", "c", ""]);
        assert!(chunks.last().is_some_and(StreamChunk::is_final));
    }

    #[tokio::test]
    async fn mock_client_records_requests() {
        let client = MockLlmClient::new("mock-model");
        let response = client
            .complete(CompletionRequest::new(vec![Message::user("ping")]))
            .await
            .expect("fallback should succeed");

        assert_eq!(response.content.as_deref(), Some("mock-echo: ping"));
        assert_eq!(client.requests().await.len(), 1);
    }

    #[tokio::test]
    async fn mock_client_interrupts_mid_stream() {
        let client = MockLlmClient::from_steps(
            "mock-model",
            vec![MockStep::interrupted(["part"], "connection reset")],
        );

        let mut stream = client.complete_stream(CompletionRequest::new(vec![Message::user("x")]));
        assert_eq!(stream.next().await.unwrap().unwrap().text, "part");
        assert!(stream.next().await.unwrap().is_err());
        assert!(stream.next().await.is_none());
    }
}
