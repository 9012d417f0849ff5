//! Chat pipeline: history → prompt → streamed model reply.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;

use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::context::ContextProvider;
use crate::error::{AiError, Result};
use crate::llm::{CompletionRequest, LlmClient, Message};
use crate::prompt::{PromptTemplate, VITABOT_TEMPLATE};

/// Temperature used when none is configured.
pub const DEFAULT_TEMPERATURE: f32 = 0.0;

/// Stream of reply text fragments, in model order.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// One message of the conversation as sent by the chat client.
///
/// The role is kept as free text; it is echoed into the prompt unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

impl ChatTurn {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// `"role: content"`
pub fn format_turn(turn: &ChatTurn) -> String {
    format!("{}: {}", turn.role, turn.content)
}

/// Split a conversation into the formatted prior history and the latest
/// question.
pub fn split_conversation(messages: &[ChatTurn]) -> Result<(String, String)> {
    let Some((last, history)) = messages.split_last() else {
        return Err(AiError::InvalidInput(
            "Messages array is missing or empty".to_string(),
        ));
    };

    let chat_history = history
        .iter()
        .map(format_turn)
        .collect::<Vec<_>>()
        .join("\n");
    Ok((chat_history, last.content.clone()))
}

pub struct ChatChain {
    template: PromptTemplate,
    context: Arc<ContextProvider>,
    temperature: f32,
}

impl ChatChain {
    pub fn new(context: Arc<ContextProvider>) -> Result<Self> {
        Ok(Self {
            template: PromptTemplate::from_template(VITABOT_TEMPLATE)?,
            context,
            temperature: DEFAULT_TEMPERATURE,
        })
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Render the prompt for a conversation, loading context per the
    /// provider's reload policy.
    pub async fn render_prompt(&self, messages: &[ChatTurn]) -> Result<String> {
        let (chat_history, question) = split_conversation(messages)?;
        let context = self.context.context_text().await?;

        let values = HashMap::from([
            ("context", context),
            ("chat_history", chat_history),
            ("question", question),
        ]);
        self.template.format(&values)
    }

    /// The rendered prompt goes to the model as a single user message.
    pub fn build_request(&self, prompt: String) -> CompletionRequest {
        CompletionRequest::new(vec![Message::user(prompt)]).with_temperature(self.temperature)
    }

    /// Render the prompt and open the model stream. Errors up to opening the
    /// stream are returned directly; later ones arrive as stream items.
    pub async fn stream(&self, client: &dyn LlmClient, messages: &[ChatTurn]) -> Result<TextStream> {
        let prompt = self.render_prompt(messages).await?;
        tracing::debug!(
            provider = client.provider(),
            model = client.model(),
            prompt_bytes = prompt.len(),
            "Invoking model"
        );

        let chunks = client.complete_stream(self.build_request(prompt));
        let text = chunks.filter_map(|item| async move {
            match item {
                Ok(chunk) if !chunk.text.is_empty() => Some(Ok(chunk.text)),
                Ok(chunk) => {
                    if let Some(usage) = chunk.usage {
                        tracing::debug!(
                            prompt_tokens = usage.prompt_tokens,
                            completion_tokens = usage.completion_tokens,
                            "Model stream finished"
                        );
                    }
                    None
                }
                Err(e) => Some(Err(e)),
            }
        });
        Ok(Box::pin(text))
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use futures::TryStreamExt;

    use super::*;
    use crate::context::{ContextSource, Document, ReloadPolicy};
    use crate::llm::{MockLlmClient, MockStep};

    struct FixedSource(Vec<&'static str>);

    #[async_trait]
    impl ContextSource for FixedSource {
        async fn load(&self) -> Result<Vec<Document>> {
            Ok(self
                .0
                .iter()
                .enumerate()
                .map(|(i, text)| Document::new(*text, "fixed", i + 1))
                .collect())
        }

        fn describe(&self) -> String {
            "fixed".to_string()
        }
    }

    fn chain(docs: Vec<&'static str>) -> ChatChain {
        let provider = ContextProvider::new(Arc::new(FixedSource(docs)), ReloadPolicy::PerRequest);
        ChatChain::new(Arc::new(provider)).unwrap()
    }

    fn turns() -> Vec<ChatTurn> {
        vec![
            ChatTurn::new("user", "A"),
            ChatTurn::new("assistant", "B"),
            ChatTurn::new("user", "C"),
        ]
    }

    #[test]
    fn test_split_conversation() {
        let (history, question) = split_conversation(&turns()).unwrap();
        assert_eq!(history, "user: A\nassistant: B");
        assert_eq!(question, "C");
    }

    #[test]
    fn test_split_single_message_has_empty_history() {
        let (history, question) =
            split_conversation(&[ChatTurn::new("user", "What helps with sleep?")]).unwrap();
        assert_eq!(history, "");
        assert_eq!(question, "What helps with sleep?");
    }

    #[test]
    fn test_split_empty_is_invalid_input() {
        assert!(matches!(
            split_conversation(&[]),
            Err(AiError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_render_prompt_substitutes_all_fields() {
        let prompt = chain(vec!["Peanuts", "Insomnia"])
            .render_prompt(&turns())
            .await
            .unwrap();

        assert!(prompt.starts_with("Answer the user's questions"));
        assert!(prompt.contains("Context: Peanuts\n\nInsomnia\n"));
        assert!(prompt.contains("Current conversation: user: A\nassistant: B\n\nuser: C\n"));
        assert!(prompt.ends_with("assistant:"));
    }

    #[tokio::test]
    async fn test_stream_matches_complete_output() {
        let fragments = ["Magnesium", " glycinate", " may", " help", " \u{1F634}"];
        let client = MockLlmClient::from_steps(
            "mock-model",
            vec![MockStep::fragments(fragments), MockStep::fragments(fragments)],
        );
        let chain = chain(vec!["Insomnia"]);

        let streamed: Vec<String> = chain
            .stream(&client, &turns())
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();

        let prompt = chain.render_prompt(&turns()).await.unwrap();
        let complete = client
            .complete(chain.build_request(prompt))
            .await
            .unwrap()
            .content
            .unwrap();

        assert_eq!(streamed, fragments);
        assert_eq!(streamed.concat(), complete);
    }

    #[tokio::test]
    async fn test_stream_sends_single_user_prompt_at_configured_temperature() {
        let client = MockLlmClient::new("mock-model");
        let chain = chain(vec![]).with_temperature(0.0);

        let _ = chain
            .stream(&client, &turns())
            .await
            .unwrap()
            .try_collect::<Vec<_>>()
            .await
            .unwrap();

        let requests = client.requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].temperature, Some(0.0));
        assert_eq!(requests[0].messages.len(), 1);
        assert!(requests[0].messages[0].content.contains("user: C"));
    }
}
