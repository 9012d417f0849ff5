//! HTTP transport to the chat endpoint.

use std::pin::Pin;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::conversation::ChatMessage;
use crate::error::{ClientError, Result};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:3000/api/chat";

/// Reply text fragments in the order the server sent them.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Sends a conversation and returns the streamed reply.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, messages: &[ChatMessage]) -> Result<FragmentStream>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
    details: Option<String>,
}

pub struct HttpTransport {
    client: Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn send(&self, messages: &[ChatMessage]) -> Result<FragmentStream> {
        tracing::debug!(endpoint = %self.endpoint, messages = messages.len(), "Sending chat request");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&ChatRequest { messages })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ErrorBody>(&body) {
                Ok(ErrorBody {
                    details: Some(details),
                    ..
                }) => details,
                Ok(ErrorBody {
                    error: Some(error), ..
                }) => error,
                _ if body.is_empty() => status.to_string(),
                _ => body,
            };
            return Err(ClientError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = Box::pin(response.bytes_stream());
        let stream = futures::stream::unfold(
            Some((bytes, Utf8Decoder::new())),
            |state| async move {
                let (mut bytes, mut decoder) = state?;
                loop {
                    match bytes.next().await {
                        Some(Ok(chunk)) => {
                            let text = decoder.push(&chunk);
                            if !text.is_empty() {
                                return Some((Ok(text), Some((bytes, decoder))));
                            }
                        }
                        Some(Err(e)) => {
                            return Some((Err(ClientError::Stream(e.to_string())), None));
                        }
                        None => {
                            let tail = decoder.finish();
                            return (!tail.is_empty()).then_some((Ok(tail), None));
                        }
                    }
                }
            },
        );
        Ok(Box::pin(stream))
    }
}

/// Incremental UTF-8 decoding across chunk boundaries.
///
/// A multi-byte character split between two chunks is held back until the
/// rest arrives. Invalid sequences are replaced with U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        let mut out = String::new();

        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    out.push_str(text);
                    self.pending.clear();
                    return out;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[..valid]));
                    match e.error_len() {
                        Some(bad) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            self.pending.drain(..valid + bad);
                        }
                        None => {
                            // Incomplete trailing character: wait for more bytes.
                            self.pending.drain(..valid);
                            return out;
                        }
                    }
                }
            }
        }
    }

    /// Flush at end of stream; a dangling partial character becomes U+FFFD.
    pub fn finish(self) -> String {
        String::from_utf8_lossy(&self.pending).into_owned()
    }
}
