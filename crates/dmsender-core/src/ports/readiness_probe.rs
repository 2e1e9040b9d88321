//! Readiness probe trait.

use std::time::Duration;

use async_trait::async_trait;

use crate::readiness::{ProbeOutcome, ProbeTarget};

/// A single connect-and-close check against the backend.
///
/// Implementations make exactly one attempt and never retry; the
/// orchestrator owns the retry schedule.
#[async_trait]
pub trait ReadinessProbe: Send + Sync {
    /// Attempt one connection to `target`, giving up after `timeout`.
    async fn probe(&self, target: &ProbeTarget, timeout: Duration) -> ProbeOutcome;
}
