//! In-memory conversation state.
//!
//! Messages are append-only. At most one assistant reply is in flight; while
//! it streams, new submissions are rejected.

use serde::{Deserialize, Serialize};

use crate::error::{ClientError, Result};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MessageStatus {
    #[default]
    Complete,
    Streaming,
    /// The stream broke off; the content is what arrived before that.
    Interrupted,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    #[serde(skip)]
    pub status: MessageStatus,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            status: MessageStatus::Complete,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            status: MessageStatus::Complete,
        }
    }
}

#[derive(Debug, Default)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
    in_flight: bool,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Append the user's message and mark a reply as pending.
    pub fn begin_turn(&mut self, text: &str) -> Result<()> {
        if self.in_flight {
            return Err(ClientError::Busy);
        }
        if text.trim().is_empty() {
            return Err(ClientError::EmptyInput);
        }

        self.messages.push(ChatMessage::user(text));
        self.in_flight = true;
        Ok(())
    }

    /// Messages to send to the endpoint. The pending reply is not included.
    pub fn request_messages(&self) -> Vec<ChatMessage> {
        self.messages
            .iter()
            .filter(|m| m.status != MessageStatus::Streaming)
            .cloned()
            .collect()
    }

    /// Open the in-progress assistant message.
    pub fn start_reply(&mut self) {
        if self.streaming_reply().is_none() {
            let mut reply = ChatMessage::assistant("");
            reply.status = MessageStatus::Streaming;
            self.messages.push(reply);
        }
    }

    pub fn append_fragment(&mut self, fragment: &str) {
        self.start_reply();
        if let Some(reply) = self.streaming_reply() {
            reply.content.push_str(fragment);
        }
    }

    /// End-of-data: the reply is complete.
    pub fn complete_reply(&mut self) {
        if let Some(reply) = self.streaming_reply() {
            reply.status = MessageStatus::Complete;
        }
        self.in_flight = false;
    }

    /// The request failed. The user's message stays; an empty reply is
    /// dropped and a partial one is kept as interrupted.
    pub fn fail_reply(&mut self) {
        let drop_empty = match self.streaming_reply() {
            Some(reply) if reply.content.is_empty() => true,
            Some(reply) => {
                reply.status = MessageStatus::Interrupted;
                false
            }
            None => false,
        };
        if drop_empty {
            self.messages.pop();
        }
        self.in_flight = false;
    }

    /// Forget everything. Only allowed when nothing is streaming.
    pub fn reset(&mut self) -> Result<()> {
        if self.in_flight {
            return Err(ClientError::Busy);
        }
        self.messages.clear();
        Ok(())
    }

    fn streaming_reply(&mut self) -> Option<&mut ChatMessage> {
        self.messages
            .last_mut()
            .filter(|m| m.role == Role::Assistant && m.status == MessageStatus::Streaming)
    }
}
