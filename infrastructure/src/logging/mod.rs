//! Logging infrastructure: structured deliberation transcripts.
//!
//! Provides [`JsonlEventSink`], a JSONL file writer that implements
//! the [`EventSink`](panel_application::EventSink) port.

mod jsonl_event_sink;

pub use jsonl_event_sink::JsonlEventSink;
