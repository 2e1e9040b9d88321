//! Startup stages inferred from backend console output.
//!
//! The backend is a Spring Boot application; its startup is observed through
//! three milestones printed on stdout. Stages are ordered, and the derived
//! `Ord` follows declaration order.

use serde::{Deserialize, Serialize};

/// Ordered startup milestones of one backend lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StartupStage {
    /// Nothing recognised yet.
    Idle,
    /// The JVM is up and the Spring context is being created.
    SpringContextStarting,
    /// The embedded Tomcat bound its port.
    WebServerBound,
    /// Spring reported the application as started.
    ApplicationReady,
}

impl StartupStage {
    /// Stages that can be reached from log output, in order.
    pub const DETECTABLE: [Self; 3] = [
        Self::SpringContextStarting,
        Self::WebServerBound,
        Self::ApplicationReady,
    ];

    /// Substring whose presence in a line marks this stage as reached.
    ///
    /// Matching is case-sensitive containment. `Idle` has no trigger.
    pub const fn trigger(self) -> Option<&'static str> {
        match self {
            Self::Idle => None,
            Self::SpringContextStarting => Some("Starting DanmakuSenderApplication"),
            Self::WebServerBound => Some("Tomcat started on port(s): 8010"),
            Self::ApplicationReady => Some("Started DanmakuSenderApplication"),
        }
    }

    /// Status line shown when the stage is reached.
    pub const fn description(self) -> &'static str {
        match self {
            Self::Idle => "Waiting for backend output...",
            Self::SpringContextStarting => {
                "Java runtime started, Spring Boot application is starting..."
            }
            Self::WebServerBound => "Tomcat server started (port: 8010)",
            Self::ApplicationReady => "Spring Boot application started, preparing to connect...",
        }
    }

    /// Position in [`Self::DETECTABLE`], `None` for `Idle`.
    pub const fn slot(self) -> Option<usize> {
        match self {
            Self::Idle => None,
            Self::SpringContextStarting => Some(0),
            Self::WebServerBound => Some(1),
            Self::ApplicationReady => Some(2),
        }
    }

    /// True for the stage that ends log-based detection.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::ApplicationReady)
    }
}

/// A one-time transition into a newly reached stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTransition {
    pub stage: StartupStage,
}

impl StageTransition {
    pub const fn new(stage: StartupStage) -> Self {
        Self { stage }
    }

    pub const fn description(&self) -> &'static str {
        self.stage.description()
    }
}
