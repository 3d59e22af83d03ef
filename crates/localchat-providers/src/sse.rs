//! Server-sent events decoding for streaming chat completions.
//!
//! OpenAI-compatible servers stream `data: {chunk}` lines separated by blank
//! lines and finish with `data: [DONE]`. Network chunks split lines (and
//! UTF-8 sequences) arbitrarily, so bytes are buffered until a full line is
//! available.

use std::collections::VecDeque;

use futures_util::stream::{self, BoxStream, Stream, StreamExt};
use tracing::{debug, warn};

use localchat_core::types::{ChatCompletionChunk, Fragment};

use crate::traits::FragmentStream;

/// A decoded SSE event relevant to chat completions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SseEvent {
    /// Payload of a `data:` line.
    Data(String),
    /// The `[DONE]` terminator.
    Done,
}

/// Incremental line decoder for an SSE byte stream.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes; returns every event completed by them.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(bytes);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(event) = parse_line(&line[..line.len() - 1]) {
                events.push(event);
            }
        }
        events
    }

    /// Flush a trailing line that was not newline-terminated.
    pub fn finish(&mut self) -> Vec<SseEvent> {
        let line = std::mem::take(&mut self.buffer);
        parse_line(&line).into_iter().collect()
    }
}

fn parse_line(line: &[u8]) -> Option<SseEvent> {
    let line = String::from_utf8_lossy(line);
    let line = line.trim_end_matches('\r');

    // Blank separators, comments (`: keep-alive`) and other fields are ignored.
    let payload = line.strip_prefix("data:")?.trim_start();
    if payload.is_empty() {
        return None;
    }
    if payload == "[DONE]" {
        return Some(SseEvent::Done);
    }
    Some(SseEvent::Data(payload.to_string()))
}

// ─────────────────────────────────────────────
// Byte stream → fragment stream
// ─────────────────────────────────────────────

struct SseState {
    body: BoxStream<'static, Result<Vec<u8>, String>>,
    decoder: SseDecoder,
    pending: VecDeque<anyhow::Result<Fragment>>,
    finished: bool,
}

impl SseState {
    fn enqueue(&mut self, events: Vec<SseEvent>) {
        for event in events {
            match event {
                SseEvent::Done => {
                    debug!("stream terminated by [DONE]");
                    self.finished = true;
                    return;
                }
                SseEvent::Data(payload) => {
                    match serde_json::from_str::<ChatCompletionChunk>(&payload) {
                        Ok(chunk) => {
                            let fragment = Fragment::from(chunk);
                            if fragment.content.is_some() || fragment.usage.is_some() {
                                self.pending.push_back(Ok(fragment));
                            }
                        }
                        Err(e) => {
                            warn!(error = %e, payload = %payload, "unparseable stream chunk");
                            self.pending.push_back(Err(anyhow::anyhow!(
                                "Error parsing stream chunk: {e}: {payload}"
                            )));
                            self.finished = true;
                            return;
                        }
                    }
                }
            }
        }
    }
}

/// Turn an SSE response body into a stream of fragments.
///
/// Chunks without content or usage (role announcements, finish markers) are
/// skipped. Reading stops at `[DONE]`, at end of body, or after the first error.
pub fn fragments_from_sse<S, B, E>(body: S) -> FragmentStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    let state = SseState {
        body: body
            .map(|chunk| chunk.map(|b| b.as_ref().to_vec()).map_err(|e| e.to_string()))
            .boxed(),
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.finished {
                return None;
            }
            match state.body.next().await {
                Some(Ok(bytes)) => {
                    let events = state.decoder.push(&bytes);
                    state.enqueue(events);
                }
                Some(Err(e)) => {
                    state.finished = true;
                    state
                        .pending
                        .push_back(Err(anyhow::anyhow!("Error reading LLM stream: {e}")));
                }
                None => {
                    let events = state.decoder.finish();
                    state.enqueue(events);
                    state.finished = true;
                }
            }
        }
    })
    .boxed()
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
