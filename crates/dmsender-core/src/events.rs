//! Notifications delivered to the presentation layer.
//!
//! Events are serialized with a `type` tag so any transport (a channel, a
//! webview bridge, a log) sees the same shape.

use serde::{Deserialize, Serialize};

/// A supervisor notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SupervisorEvent {
    /// Human-readable progress line.
    StageStatus { message: String },
    /// Raw stdout line from the backend.
    RawLog { line: String },
    /// Raw stderr line from the backend.
    RawError { line: String },
    /// Backend line carrying the warning marker.
    Warning { line: String },
    /// The backend process exited.
    ProcessExited { code: Option<i32> },
    /// The backend was restarted successfully.
    ProcessRestarted,
}

impl SupervisorEvent {
    pub fn status(message: impl Into<String>) -> Self {
        Self::StageStatus {
            message: message.into(),
        }
    }

    /// Channel name of this event.
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::StageStatus { .. } => "stageStatus",
            Self::RawLog { .. } => "rawLog",
            Self::RawError { .. } => "rawError",
            Self::Warning { .. } => "warning",
            Self::ProcessExited { .. } => "processExited",
            Self::ProcessRestarted => "processRestarted",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_tag() {
        let json = serde_json::to_value(SupervisorEvent::status("ready")).unwrap();
        assert_eq!(json["type"], "stageStatus");
        assert_eq!(json["message"], "ready");

        let json = serde_json::to_value(SupervisorEvent::ProcessExited { code: Some(1) }).unwrap();
        assert_eq!(json["type"], "processExited");
        assert_eq!(json["code"], 1);

        let json = serde_json::to_value(SupervisorEvent::ProcessRestarted).unwrap();
        assert_eq!(json["type"], "processRestarted");
    }

    #[test]
    fn event_name_matches_tag() {
        let events = [
            SupervisorEvent::status("x"),
            SupervisorEvent::RawLog { line: "x".into() },
            SupervisorEvent::RawError { line: "x".into() },
            SupervisorEvent::Warning { line: "x".into() },
            SupervisorEvent::ProcessExited { code: None },
            SupervisorEvent::ProcessRestarted,
        ];
        for event in events {
            let json = serde_json::to_value(&event).unwrap();
            assert_eq!(json["type"], event.event_name());
        }
    }

    #[test]
    fn roundtrips_through_json() {
        let event = SupervisorEvent::Warning {
            line: "WARN pool exhausted".into(),
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: SupervisorEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
