use std::sync::Arc;
use vitabot_ai::{ChatChain, LlmClientFactory};

/// Application state shared across all API handlers
#[derive(Clone)]
pub struct AppState {
    /// Prompt pipeline, holding the read-only context handle
    pub chain: Arc<ChatChain>,
    /// Builds the model client per request, resolving the credential
    pub llm: Arc<dyn LlmClientFactory>,
}

impl AppState {
    pub fn new(chain: ChatChain, llm: Arc<dyn LlmClientFactory>) -> Self {
        Self {
            chain: Arc::new(chain),
            llm,
        }
    }
}
