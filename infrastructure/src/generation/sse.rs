//! Incremental parser for chat-completions server-sent events.
//!
//! Network chunks do not respect line boundaries, so bytes are buffered
//! until a full `\n`-terminated line is available.

use serde::Deserialize;

/// One parsed SSE payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SseEvent {
    Delta(String),
    Done,
    /// A `data:` line that was not a valid completion chunk
    Invalid(String),
}

#[derive(Debug, Deserialize)]
struct ChunkPayload {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Default)]
pub(crate) struct SseBuffer {
    pending: Vec<u8>,
}

impl SseBuffer {
    /// Feed raw bytes, returning every event completed by them.
    pub(crate) fn push(&mut self, bytes: &[u8]) -> Vec<SseEvent> {
        self.pending.extend_from_slice(bytes);
        let mut events = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            if let Some(event) = parse_line(line.trim_end_matches(['\r', '\n'])) {
                events.push(event);
            }
        }
        events
    }

    /// Parse a trailing line that arrived without a newline.
    pub(crate) fn finish(&mut self) -> Option<SseEvent> {
        let rest = std::mem::take(&mut self.pending);
        let line = String::from_utf8_lossy(&rest);
        parse_line(line.trim())
    }
}

fn parse_line(line: &str) -> Option<SseEvent> {
    let data = line.strip_prefix("data:")?.trim_start();
    if data == "[DONE]" {
        return Some(SseEvent::Done);
    }
    match serde_json::from_str::<ChunkPayload>(data) {
        Ok(payload) => {
            let text: String = payload
                .choices
                .into_iter()
                .filter_map(|c| c.delta.content)
                .collect();
            (!text.is_empty()).then_some(SseEvent::Delta(text))
        }
        Err(e) => Some(SseEvent::Invalid(format!("{}: {}", e, data))),
    }
}
