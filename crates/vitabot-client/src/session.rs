//! One chat session: conversation state plus the transport it talks over.

use std::sync::Arc;

use futures::StreamExt;

use crate::conversation::{ChatMessage, Conversation};
use crate::error::{ClientError, Result};
use crate::transport::ChatTransport;

/// Presents the conversation. `render` is called after every state change
/// so the reply appears as it streams in.
pub trait ChatView {
    fn render(&mut self, conversation: &Conversation);
    fn on_error(&mut self, error: &ClientError);
}

/// How a submitted turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    Complete,
    /// The error was already passed to [`ChatView::on_error`].
    Failed,
}

pub struct ChatSession {
    conversation: Conversation,
    transport: Arc<dyn ChatTransport>,
}

impl ChatSession {
    pub fn new(transport: Arc<dyn ChatTransport>) -> Self {
        Self {
            conversation: Conversation::new(),
            transport,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn reset(&mut self) -> Result<()> {
        self.conversation.reset()
    }

    /// Send `text` and stream the reply into the conversation.
    ///
    /// Returns `Err` only when the input is rejected (blank, or a reply is
    /// still in flight). Transport and stream failures are reported through
    /// the view, yield [`TurnOutcome::Failed`] and leave the conversation
    /// usable.
    pub async fn submit(&mut self, text: &str, view: &mut dyn ChatView) -> Result<TurnOutcome> {
        self.conversation.begin_turn(text)?;
        view.render(&self.conversation);

        let messages = self.conversation.request_messages();
        self.conversation.start_reply();

        match self.stream_reply(&messages, view).await {
            Ok(fragments) => {
                tracing::debug!(fragments, "Reply complete");
                self.conversation.complete_reply();
                view.render(&self.conversation);
                Ok(TurnOutcome::Complete)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Reply failed");
                self.conversation.fail_reply();
                view.render(&self.conversation);
                view.on_error(&e);
                Ok(TurnOutcome::Failed)
            }
        }
    }

    async fn stream_reply(
        &mut self,
        messages: &[ChatMessage],
        view: &mut dyn ChatView,
    ) -> Result<usize> {
        let mut stream = self.transport.send(messages).await?;
        let mut count = 0;
        while let Some(fragment) = stream.next().await {
            let fragment = fragment?;
            self.conversation.append_fragment(&fragment);
            count += 1;
            view.render(&self.conversation);
        }
        Ok(count)
    }
}
