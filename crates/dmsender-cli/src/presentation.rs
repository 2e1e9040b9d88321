//! Console presentation of supervisor events.
//!
//! Stands in for the loading page of the desktop shell: status lines,
//! warnings and (with `--verbose`) raw backend output.

use std::path::Path;

use dmsender_core::SupervisorEvent;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

/// Format one event for the console. `None` means the event is not shown.
pub fn render_event(event: &SupervisorEvent, verbose: bool) -> Option<String> {
    match event {
        SupervisorEvent::StageStatus { message } => Some(format!("» {message}")),
        SupervisorEvent::Warning { line } => Some(format!("⚠ {line}")),
        SupervisorEvent::RawLog { line } if verbose => Some(format!("  │ {line}")),
        SupervisorEvent::RawError { line } if verbose => Some(format!("  ! {line}")),
        SupervisorEvent::RawLog { .. } | SupervisorEvent::RawError { .. } => None,
        SupervisorEvent::ProcessExited { code } => Some(match code {
            Some(code) => format!("✗ Backend process exited with code {code}"),
            None => "✗ Backend process exited".to_string(),
        }),
        SupervisorEvent::ProcessRestarted => Some("↻ Backend process restarted".to_string()),
    }
}

/// Print events until the channel closes.
pub fn spawn_console_renderer(
    mut rx: broadcast::Receiver<SupervisorEvent>,
    verbose: bool,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let Some(line) = render_event(&event, verbose) {
                        println!("{line}");
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    println!("  … {skipped} backend messages skipped");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

pub fn print_live(url: &str) {
    println!();
    println!("✓ Backend is ready: {url}");
    println!("  Press Ctrl-C to stop.");
}

/// Failure view shown when the backend never became reachable.
pub fn print_unreachable(target: &str, log_path: &Path) {
    println!();
    println!("✗ Unable to connect to the backend at {target}.");
    println!("  Backend log: {}", log_path.display());
    #[cfg(unix)]
    println!("  Send SIGHUP to retry, or Ctrl-C to quit.");
}

pub fn print_start_failed(log_path: &Path) {
    println!();
    println!("✗ The backend could not be started.");
    println!("  Check the Java runtime and app.jar paths (DMSENDER_JAVA, DMSENDER_JAR).");
    println!("  Backend log: {}", log_path.display());
}
