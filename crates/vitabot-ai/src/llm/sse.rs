//! Incremental Server-Sent Events decoder for provider streams.
//!
//! Network chunks do not respect event or UTF-8 boundaries, so bytes are
//! buffered until a blank line terminates an event. Only `data:` fields are
//! surfaced; comments, `event:` and `id:` fields are ignored.

const DONE_MARKER: &str = "[DONE]";

/// A decoded SSE payload.
#[derive(Debug, Clone, PartialEq)]
pub enum SseEvent {
    Data(String),
    Done,
}

#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes, returning every event completed by them.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(bytes);

        let mut events = Vec::new();
        while let Some((end, sep_len)) = find_event_boundary(&self.buffer) {
            let raw: Vec<u8> = self.buffer.drain(..end + sep_len).collect();
            events.extend(parse_event(&raw[..end]));
        }
        events
    }

    /// Flush whatever remains once the byte stream has ended.
    ///
    /// Handles a last event that lost its trailing blank line, e.g. after a
    /// network interruption.
    pub fn finish(mut self) -> Vec<SseEvent> {
        let rest = std::mem::take(&mut self.buffer);
        if rest.iter().all(u8::is_ascii_whitespace) {
            return Vec::new();
        }
        parse_event(&rest)
    }
}

fn find_event_boundary(buffer: &[u8]) -> Option<(usize, usize)> {
    let lf = buffer.windows(2).position(|w| w == b"\n\n").map(|p| (p, 2));
    let crlf = buffer
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .map(|p| (p, 4));

    match (lf, crlf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

fn parse_event(raw: &[u8]) -> Vec<SseEvent> {
    let text = String::from_utf8_lossy(raw);
    let mut data_lines = Vec::new();

    for line in text.lines() {
        let line = line.trim_end_matches('\r');
        if let Some(value) = line.strip_prefix("data:") {
            data_lines.push(value.strip_prefix(' ').unwrap_or(value));
        }
    }

    if data_lines.is_empty() {
        return Vec::new();
    }

    let data = data_lines.join("\n");
    if data.trim() == DONE_MARKER {
        vec![SseEvent::Done]
    } else if data.trim().is_empty() {
        Vec::new()
    } else {
        vec![SseEvent::Data(data)]
    }
}
