//! JSONL file writer for deliberation events.
//!
//! Each [`DeliberationEvent`] is serialized as a single JSON line carrying
//! its `type`, the `session_id` and a `timestamp`, appended to the file via
//! a buffered writer.

use panel_application::{DeliberationEvent, EventSink};
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// Event sink that writes one JSON object per line.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Flushes after every line and
/// on `Drop`.
pub struct JsonlEventSink {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlEventSink {
    /// Open `path` for appending, creating it and its parent directories.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn record(session_id: &str, event: &DeliberationEvent) -> serde_json::Value {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        let mut value = serde_json::to_value(event).unwrap_or_else(|_| {
            serde_json::json!({ "type": event.event_type() })
        });
        if let serde_json::Value::Object(map) = &mut value {
            map.insert(
                "session_id".to_string(),
                serde_json::Value::String(session_id.to_string()),
            );
            map.insert(
                "timestamp".to_string(),
                serde_json::Value::String(timestamp),
            );
        }
        value
    }
}

impl EventSink for JsonlEventSink {
    fn emit(&self, session_id: &str, event: &DeliberationEvent) {
        let Ok(line) = serde_json::to_string(&Self::record(session_id, event)) else {
            return;
        };

        if let Ok(mut writer) = self.writer.lock() {
            // Append-only transcript; flush per line so a crash loses at most one event
            if let Err(e) = writeln!(writer, "{}", line).and_then(|_| writer.flush()) {
                warn!("Could not write event to {}: {}", self.path.display(), e);
            }
        }
    }
}

impl Drop for JsonlEventSink {
    fn drop(&mut self) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writer.flush();
        }
    }
}
