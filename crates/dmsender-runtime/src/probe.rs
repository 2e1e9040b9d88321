//! TCP readiness probe.

use std::time::Duration;

use async_trait::async_trait;
use dmsender_core::{ProbeOutcome, ProbeTarget, ReadinessProbe};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::debug;

/// Probes readiness by opening (and immediately closing) a TCP connection.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpReadinessProbe;

impl TcpReadinessProbe {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ReadinessProbe for TcpReadinessProbe {
    async fn probe(&self, target: &ProbeTarget, timeout: Duration) -> ProbeOutcome {
        let authority = target.authority();

        // On timeout the connect future is dropped, which releases the socket.
        match tokio::time::timeout(timeout, TcpStream::connect(authority.as_str())).await {
            Ok(Ok(mut stream)) => {
                let _ = stream.shutdown().await;
                debug!(target = %authority, "Backend port accepted connection");
                ProbeOutcome::Reachable
            }
            Ok(Err(e)) => {
                debug!(target = %authority, error = %e, "Backend port unreachable");
                ProbeOutcome::Unreachable
            }
            Err(_) => {
                debug!(target = %authority, timeout_ms = timeout.as_millis(), "Backend probe timed out");
                ProbeOutcome::TimedOut
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn reachable_when_listening() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let accept = tokio::spawn(async move { listener.accept().await.is_ok() });

        let outcome = TcpReadinessProbe::new()
            .probe(&ProbeTarget::new("127.0.0.1", port), Duration::from_secs(2))
            .await;

        assert_eq!(outcome, ProbeOutcome::Reachable);
        assert!(accept.await.unwrap());
    }

    #[tokio::test]
    async fn unreachable_when_nothing_listens() {
        // Bind then drop to get a port that is very likely closed.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };

        let outcome = TcpReadinessProbe::new()
            .probe(&ProbeTarget::new("127.0.0.1", port), Duration::from_secs(2))
            .await;

        assert_eq!(outcome, ProbeOutcome::Unreachable);
    }

    #[tokio::test]
    async fn unanswered_connect_times_out_at_the_deadline() {
        // Non-routable address: the SYN is dropped and never answered.
        let target = ProbeTarget::new("10.255.255.1", 81);
        let limit = Duration::from_millis(300);

        let started = std::time::Instant::now();
        let outcome = TcpReadinessProbe::new().probe(&target, limit).await;
        let elapsed = started.elapsed();

        if outcome == ProbeOutcome::Unreachable {
            // Hosts without a default route fail the connect immediately.
            return;
        }
        assert_eq!(outcome, ProbeOutcome::TimedOut);
        assert!(elapsed >= limit, "timed out early after {elapsed:?}");
    }

    #[tokio::test]
    async fn reachable_over_ipv6_loopback() {
        let Ok(listener) = TcpListener::bind("[::1]:0").await else {
            // IPv6 disabled on this host.
            return;
        };
        let port = listener.local_addr().unwrap().port();
        let accept = tokio::spawn(async move { listener.accept().await.is_ok() });

        let outcome = TcpReadinessProbe::new()
            .probe(&ProbeTarget::new("::1", port), Duration::from_secs(2))
            .await;

        assert_eq!(outcome, ProbeOutcome::Reachable);
        assert!(accept.await.unwrap());
    }

    #[tokio::test]
    async fn zero_timeout_does_not_report_reachable_for_closed_port() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };

        let outcome = TcpReadinessProbe::new()
            .probe(&ProbeTarget::new("127.0.0.1", port), Duration::ZERO)
            .await;

        assert_ne!(outcome, ProbeOutcome::Reachable);
    }
}
