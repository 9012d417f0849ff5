//! VitaBot AI - prompt pipeline behind the chat endpoint
//!
//! This crate provides:
//! - Static JSON context loading with an explicit reload policy
//! - Prompt templates
//! - A streaming OpenAI-compatible chat-completion client
//! - The chat chain tying them together

pub mod chain;
pub mod context;
pub mod error;
mod http_client;
pub mod llm;
pub mod prompt;

// Re-export commonly used types
pub use chain::{ChatChain, ChatTurn, TextStream};
pub use context::{ContextProvider, ContextSource, Document, JsonLoader, ReloadPolicy};
pub use error::{AiError, Result};
pub use llm::{
    LlmClient, LlmClientFactory, Message, ModelSpec, OpenAIClient, OpenAIClientFactory, Role,
    StaticClientFactory,
};
pub use prompt::PromptTemplate;
