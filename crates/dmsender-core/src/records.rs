//! Backend log records.
//!
//! Every line the backend writes, plus one terminator per lifetime, becomes a
//! [`LogRecord`]. The rendered form is what lands in the append-only sink.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Text written before the exit code in an `[EXIT]` record.
pub const EXIT_TERMINATOR: &str = "backend process exited, code";

/// Substring marking a backend line as a warning.
pub const WARNING_MARKER: &str = "WARN";

/// Which pipe a line was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Stdout,
    Stderr,
}

/// Severity assigned to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// What produced the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Stdout,
    Stderr,
    Exit,
}

impl RecordKind {
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Stdout => "[STDOUT]",
            Self::Stderr => "[STDERR]",
            Self::Exit => "[EXIT]",
        }
    }
}

impl From<StreamKind> for RecordKind {
    fn from(stream: StreamKind) -> Self {
        match stream {
            StreamKind::Stdout => Self::Stdout,
            StreamKind::Stderr => Self::Stderr,
        }
    }
}

/// A single entry destined for the backend log sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub kind: RecordKind,
    pub text: String,
}

impl LogRecord {
    /// Record for a line read from one of the backend's pipes.
    ///
    /// Lines carrying the warning marker are `Warn` on either stream. Other
    /// stderr lines are `Error` and other stdout lines are `Info`.
    pub fn output(stream: StreamKind, line: impl Into<String>) -> Self {
        let text = line.into();
        let level = if text.contains(WARNING_MARKER) {
            LogLevel::Warn
        } else {
            match stream {
                StreamKind::Stderr => LogLevel::Error,
                StreamKind::Stdout => LogLevel::Info,
            }
        };
        Self {
            timestamp: Utc::now(),
            level,
            kind: stream.into(),
            text,
        }
    }

    /// Terminator record written once when the process exits.
    pub fn exit(code: Option<i32>) -> Self {
        let code = code.map_or_else(|| "none".to_string(), |c| c.to_string());
        Self {
            timestamp: Utc::now(),
            level: LogLevel::Info,
            kind: RecordKind::Exit,
            text: format!("{EXIT_TERMINATOR} {code}"),
        }
    }

    /// Sink representation: `<prefix> <text>`.
    pub fn render(&self) -> String {
        format!("{} {}", self.kind.prefix(), self.text)
    }
}
