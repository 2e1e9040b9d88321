//! `dmsender probe`: a single readiness check.

use dmsender_core::{ProbeOutcome, ProbeTarget, ReadinessProbe};
use dmsender_runtime::TcpReadinessProbe;
use tracing::debug;

use crate::bootstrap::CliConfig;
use crate::error::CliError;
use crate::parser::ProbeArgs;

pub async fn execute(args: &ProbeArgs) -> Result<(), CliError> {
    let config = CliConfig::for_probe(args)?;
    let settings = &config.settings;
    let target = ProbeTarget::new(settings.backend_host.clone(), settings.backend_port);

    debug!(%target, timeout_ms = settings.attempt_timeout_ms, "Probing backend");
    let outcome = TcpReadinessProbe::new()
        .probe(&target, settings.attempt_timeout())
        .await;

    match outcome {
        ProbeOutcome::Reachable => {
            println!("✓ {target} is accepting connections");
            Ok(())
        }
        ProbeOutcome::Unreachable => {
            println!("✗ {target} refused the connection");
            Err(CliError::Unreachable(target.to_string()))
        }
        ProbeOutcome::TimedOut => {
            println!(
                "✗ {target} did not answer within {} ms",
                settings.attempt_timeout_ms
            );
            Err(CliError::Unreachable(target.to_string()))
        }
    }
}
