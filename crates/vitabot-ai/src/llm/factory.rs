//! LLM client factory for per-request client creation

use std::sync::Arc;

use crate::error::{AiError, Result};
use crate::llm::openai::{DEFAULT_OPENAI_BASE_URL, DEFAULT_OPENAI_MODEL};
use crate::llm::{LlmClient, OpenAIClient};

pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Builds the model client used for one chat request.
///
/// Creation is where the provider credential is resolved, so a missing key
/// is reported before anything is sent upstream.
pub trait LlmClientFactory: Send + Sync {
    fn create_client(&self) -> Result<Arc<dyn LlmClient>>;
}

#[derive(Debug, Clone)]
pub struct ModelSpec {
    pub model: String,
    pub base_url: String,
    pub api_key_env: String,
}

impl Default for ModelSpec {
    fn default() -> Self {
        Self {
            model: DEFAULT_OPENAI_MODEL.to_string(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
        }
    }
}

/// Creates [`OpenAIClient`]s, reading the API key from the process
/// environment on every call.
pub struct OpenAIClientFactory {
    spec: ModelSpec,
}

impl OpenAIClientFactory {
    pub fn new(spec: ModelSpec) -> Self {
        Self { spec }
    }

    fn resolve_api_key(&self) -> Option<String> {
        std::env::var(&self.spec.api_key_env)
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
    }
}

impl LlmClientFactory for OpenAIClientFactory {
    fn create_client(&self) -> Result<Arc<dyn LlmClient>> {
        let api_key = self
            .resolve_api_key()
            .ok_or_else(|| AiError::MissingCredential(self.spec.api_key_env.clone()))?;

        Ok(Arc::new(
            OpenAIClient::new(api_key)
                .with_model(&self.spec.model)
                .with_base_url(&self.spec.base_url),
        ))
    }
}

/// Hands out one pre-built client. Used when the client is injected, e.g. a
/// mock in tests or a client configured by the embedding application.
pub struct StaticClientFactory {
    client: Arc<dyn LlmClient>,
}

impl StaticClientFactory {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }
}

impl LlmClientFactory for StaticClientFactory {
    fn create_client(&self) -> Result<Arc<dyn LlmClient>> {
        Ok(self.client.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credential_is_reported() {
        let factory = OpenAIClientFactory::new(ModelSpec {
            api_key_env: "VITABOT_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..ModelSpec::default()
        });

        match factory.create_client() {
            Err(AiError::MissingCredential(name)) => {
                assert_eq!(name, "VITABOT_TEST_KEY_THAT_IS_NEVER_SET")
            }
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("client should not be created without a key"),
        }
    }

    #[test]
    fn test_default_spec() {
        let spec = ModelSpec::default();
        assert_eq!(spec.model, "gpt-4o-mini");
        assert_eq!(spec.api_key_env, "OPENAI_API_KEY");
    }
}
