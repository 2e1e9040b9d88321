//! `dmsender run`: launch the backend and keep it supervised.
//!
//! The handler waits on four things at once: the current connection run,
//! host termination after an unexpected backend exit, Ctrl-C, and (on Unix)
//! SIGHUP, which restarts the backend.

use std::future::{Future, pending};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use dmsender_core::ProbeTarget;
use dmsender_runtime::{AppSession, ChannelEventSink, SessionOutcome, TcpReadinessProbe};
use tracing::{debug, info, warn};

use crate::bootstrap::CliConfig;
use crate::error::CliError;
use crate::parser::RunArgs;
use crate::presentation;

const RENDERER_FLUSH_LIMIT: Duration = Duration::from_millis(500);

type ConnectRun<'a> = Pin<Box<dyn Future<Output = SessionOutcome> + Send + 'a>>;

pub async fn execute(args: &RunArgs, verbose: bool) -> Result<(), CliError> {
    let config = CliConfig::for_run(args)?;
    let settings = &config.settings;
    info!(
        executable = %settings.executable.display(),
        artifact = %settings.artifact.display(),
        log = %config.log_path.display(),
        "Launching backend"
    );

    let sink = ChannelEventSink::new();
    let renderer = presentation::spawn_console_renderer(sink.subscribe(), verbose);
    let session = AppSession::from_settings(
        settings,
        &config.log_path,
        Arc::new(TcpReadinessProbe::new()),
        Arc::new(sink.clone()),
    );
    let termination = session.termination();
    let target = ProbeTarget::new(settings.backend_host.clone(), settings.backend_port);
    let mut restart_signal = RestartSignal::install();

    let mut run: ConnectRun<'_> = Box::pin(session.launch());
    let result = loop {
        tokio::select! {
            outcome = &mut run => {
                run = Box::pin(pending());
                match outcome {
                    SessionOutcome::Live { url } => presentation::print_live(&url),
                    SessionOutcome::Failed => {
                        presentation::print_unreachable(&target.to_string(), &config.log_path);
                    }
                    SessionOutcome::StartFailed => {
                        presentation::print_start_failed(&config.log_path);
                        break Err(CliError::StartFailed);
                    }
                    SessionOutcome::Superseded => debug!("Connection run superseded by restart"),
                }
            }
            () = termination.cancelled() => {
                let code = session
                    .supervisor()
                    .process_info()
                    .and_then(|process| process.exit_code);
                break Err(CliError::BackendExited { code });
            }
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    warn!(error = %e, "Failed to listen for Ctrl-C");
                }
                info!("Interrupted, stopping backend");
                break Ok(());
            }
            () = restart_signal.recv() => {
                info!("Restart requested");
                run = Box::pin(session.restart());
            }
        }
    };

    if !session
        .shutdown_and_wait(settings.stop_timeout() + settings.exit_grace())
        .await
    {
        warn!("Backend did not exit before the shutdown deadline");
    }

    // Closing the channel lets the renderer flush and finish.
    drop(run);
    drop(session);
    drop(sink);
    if tokio::time::timeout(RENDERER_FLUSH_LIMIT, renderer).await.is_err() {
        debug!("Console renderer did not finish before exit");
    }

    result
}

/// SIGHUP listener; never fires where SIGHUP does not exist.
struct RestartSignal {
    #[cfg(unix)]
    hangup: Option<tokio::signal::unix::Signal>,
}

impl RestartSignal {
    fn install() -> Self {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            let hangup = signal(SignalKind::hangup())
                .map_err(|e| warn!(error = %e, "Failed to install SIGHUP handler"))
                .ok();
            Self { hangup }
        }

        #[cfg(not(unix))]
        {
            Self {}
        }
    }

    async fn recv(&mut self) {
        #[cfg(unix)]
        {
            if let Some(hangup) = self.hangup.as_mut()
                && hangup.recv().await.is_some()
            {
                return;
            }
        }
        pending::<()>().await;
    }
}
