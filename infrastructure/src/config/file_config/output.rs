//! Output configuration from TOML (`[output]` section)

use panel_domain::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How the final report is printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl ReportFormat {
    pub const VALID: [&'static str; 2] = ["text", "json"];
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            other => Err(format!("unknown report format '{}'", other)),
        }
    }
}

/// Raw output configuration from TOML
///
/// ```toml
/// [output]
/// format = "text"
/// color = true
/// events_file = "./panel-events.jsonl"
/// archive_dir = "./sessions"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOutputConfig {
    pub format: String,
    /// Enable colored terminal output
    pub color: bool,
    /// JSONL transcript of deliberation events
    pub events_file: Option<PathBuf>,
    /// Directory receiving one `<session_id>.json` per finished session
    pub archive_dir: Option<PathBuf>,
}

impl Default for FileOutputConfig {
    fn default() -> Self {
        Self {
            format: "text".to_string(),
            color: true,
            events_file: None,
            archive_dir: None,
        }
    }
}

impl FileOutputConfig {
    pub fn parse_format(&self) -> (ReportFormat, Vec<ConfigIssue>) {
        match self.format.parse::<ReportFormat>() {
            Ok(format) => (format, vec![]),
            Err(_) => (
                ReportFormat::default(),
                vec![ConfigIssue::warning(
                    ConfigIssueCode::InvalidEnumValue {
                        field: "output.format".to_string(),
                        value: self.format.clone(),
                        valid_values: ReportFormat::VALID.iter().map(|s| s.to_string()).collect(),
                    },
                    format!(
                        "output.format: unknown value '{}', falling back to 'text'",
                        self.format
                    ),
                )],
            ),
        }
    }
}
