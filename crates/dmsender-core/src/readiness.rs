//! Network readiness types.

use std::fmt;
use std::net::Ipv6Addr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Host and port the backend is expected to listen on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProbeTarget {
    pub host: String,
    pub port: u16,
}

impl ProbeTarget {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// `host:port`, suitable for `TcpStream::connect`. IPv6 literals are
    /// bracketed.
    pub fn authority(&self) -> String {
        if self.host.parse::<Ipv6Addr>().is_ok() {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// URL handed to the presentation layer once the backend is live.
    pub fn live_url(&self) -> String {
        format!("http://localhost:{}", self.port)
    }
}

impl fmt::Display for ProbeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.authority())
    }
}

/// Result of a single connect attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProbeOutcome {
    /// The connection was accepted (and then closed).
    Reachable,
    /// The connection was refused, reset or otherwise failed.
    Unreachable,
    /// No answer within the attempt timeout.
    TimedOut,
}

impl ProbeOutcome {
    pub const fn is_reachable(self) -> bool {
        matches!(self, Self::Reachable)
    }
}

/// One entry in the retry history of a connection run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryAttempt {
    /// 1-based attempt number.
    pub attempt: u32,
    pub outcome: ProbeOutcome,
    pub at: DateTime<Utc>,
}

/// Terminal outcome of a connection run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ConnectionOutcome {
    /// The backend accepted a connection; the UI should load `url`.
    Live { url: String },
    /// Every attempt failed.
    Failed,
}

/// Outcome plus the attempts that led to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionReport {
    pub outcome: ConnectionOutcome,
    pub attempts: Vec<RetryAttempt>,
}

impl ConnectionReport {
    pub const fn is_live(&self) -> bool {
        matches!(self.outcome, ConnectionOutcome::Live { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_formats() {
        let target = ProbeTarget::new("127.0.0.1", 8010);
        assert_eq!(target.authority(), "127.0.0.1:8010");
        assert_eq!(target.to_string(), "127.0.0.1:8010");
        assert_eq!(target.live_url(), "http://localhost:8010");
    }

    #[test]
    fn ipv6_hosts_are_bracketed() {
        let target = ProbeTarget::new("::1", 8010);
        assert_eq!(target.authority(), "[::1]:8010");
        assert_eq!(target.to_string(), "[::1]:8010");
        assert!(target.authority().parse::<std::net::SocketAddr>().is_ok());

        assert_eq!(ProbeTarget::new("localhost", 8010).authority(), "localhost:8010");
    }

    #[test]
    fn outcome_serializes_with_tag() {
        let live = ConnectionOutcome::Live {
            url: "http://localhost:8010".into(),
        };
        let json = serde_json::to_string(&live).unwrap();
        assert_eq!(json, r#"{"type":"live","url":"http://localhost:8010"}"#);

        let json = serde_json::to_string(&ConnectionOutcome::Failed).unwrap();
        assert_eq!(json, r#"{"type":"failed"}"#);
    }
}
