use std::convert::Infallible;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use crate::api::{error::ApiError, state::AppState};
use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use futures::{Stream, StreamExt};
use serde::Deserialize;
use tracing::{debug, info, warn};
use vitabot_ai::{ChatTurn, TextStream};

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Option<Vec<ChatTurn>>,
}

// POST /api/chat
pub async fn chat(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response, ApiError> {
    // Credential first: nothing is read or sent upstream without it.
    let client = state.llm.create_client()?;

    // Any content type is accepted.
    let request: ChatRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {e}")))?;
    let messages = match request.messages {
        Some(messages) if !messages.is_empty() => messages,
        _ => {
            return Err(ApiError::BadRequest(
                "Messages array is missing or empty".to_string(),
            ));
        }
    };

    info!(
        messages = messages.len(),
        model = client.model(),
        "Chat request received"
    );

    let mut fragments = state.chain.stream(client.as_ref(), &messages).await?;

    // Wait for the first fragment so a failing model call is still reported
    // as a JSON error rather than an empty 200.
    let first = match fragments.next().await {
        Some(Ok(first)) => Some(first),
        Some(Err(e)) => return Err(e.into()),
        None => None,
    };

    let body = RelayStream::new(first, fragments);
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(body),
    )
        .into_response())
}

/// Relays model fragments to the response body.
///
/// An upstream error after the first fragment ends the body early; it is
/// logged, never forwarded. Dropping the relay before the model finished
/// means the client went away, which also drops the model stream.
struct RelayStream {
    first: Option<String>,
    inner: TextStream,
    fragments: usize,
    bytes: usize,
    started: Instant,
    finished: bool,
}

impl RelayStream {
    fn new(first: Option<String>, inner: TextStream) -> Self {
        let finished = first.is_none();
        if finished {
            debug!("Model produced an empty reply");
        }
        Self {
            first,
            inner,
            fragments: 0,
            bytes: 0,
            started: Instant::now(),
            finished,
        }
    }

    fn emit(&mut self, fragment: String) -> Poll<Option<Result<String, Infallible>>> {
        self.fragments += 1;
        self.bytes += fragment.len();
        Poll::Ready(Some(Ok(fragment)))
    }

    fn finish(&mut self) -> Poll<Option<Result<String, Infallible>>> {
        self.finished = true;
        info!(
            fragments = self.fragments,
            bytes = self.bytes,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "Chat reply streamed"
        );
        Poll::Ready(None)
    }
}

impl Stream for RelayStream {
    type Item = Result<String, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if let Some(first) = self.first.take() {
            return self.emit(first);
        }
        if self.finished {
            return Poll::Ready(None);
        }

        match self.inner.poll_next_unpin(cx) {
            Poll::Ready(Some(Ok(fragment))) => self.emit(fragment),
            Poll::Ready(Some(Err(e))) => {
                warn!(
                    error = %e,
                    fragments = self.fragments,
                    "Model stream interrupted, ending reply early"
                );
                self.finish()
            }
            Poll::Ready(None) => self.finish(),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for RelayStream {
    fn drop(&mut self) {
        if !self.finished {
            debug!(
                fragments = self.fragments,
                "Client disconnected, abandoning model stream"
            );
        }
    }
}
