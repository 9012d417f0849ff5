//! LLM module - streaming chat-completion client abstraction

mod client;
mod factory;
mod http_error;
#[cfg(any(test, feature = "test-utils"))]
mod mock_client;
mod openai;
mod sse;

pub use client::{
    CompletionRequest, CompletionResponse, FinishReason, LlmClient, Message, Role, StreamChunk,
    StreamResult, TokenUsage,
};
pub use factory::{
    DEFAULT_API_KEY_ENV, LlmClientFactory, ModelSpec, OpenAIClientFactory, StaticClientFactory,
};
#[cfg(any(test, feature = "test-utils"))]
pub use mock_client::{MockLlmClient, MockStep};
pub use openai::{DEFAULT_OPENAI_BASE_URL, DEFAULT_OPENAI_MODEL, OpenAIClient};
