//! Async stream line readers (non-UTF8-safe).
//!
//! The JVM may emit bytes that are not valid UTF-8 depending on the platform
//! charset. `BufReader::lines()` would end the reader on the first invalid
//! byte, so lines are read as bytes and decoded lossily.

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;
use tracing::debug;

use dmsender_core::StreamKind;

/// Read `stream` line by line, handing each decoded line to `on_line`.
///
/// The task ends at EOF or on the first read error; the exit itself is
/// reported by the waiter, not here.
pub fn spawn_stream_reader<F>(
    stream: impl AsyncRead + Unpin + Send + 'static,
    generation: u64,
    kind: StreamKind,
    on_line: F,
) -> JoinHandle<()>
where
    F: Fn(StreamKind, String) + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut buf: Vec<u8> = Vec::with_capacity(1024);

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break, // EOF
                Ok(_) => {
                    // Trim trailing newline(s)
                    if buf.last() == Some(&b'\n') {
                        buf.pop();
                        if buf.last() == Some(&b'\r') {
                            buf.pop();
                        }
                    }

                    let line = String::from_utf8_lossy(&buf).into_owned();
                    on_line(kind, line);
                }
                Err(e) => {
                    debug!(generation, ?kind, error = %e, "Backend output reader exiting due to read error");
                    break;
                }
            }
        }

        debug!(generation, ?kind, "Backend output reader task exiting");
    })
}
