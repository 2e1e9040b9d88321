//! Command-line shell for the Danmaku Sender backend.
//!
//! The binary in `main.rs` is the composition root; this library holds the
//! argument parser, settings bootstrap, handlers and console presentation so
//! they can be tested.

#![deny(unsafe_code)]

pub mod bootstrap;
pub mod error;
pub mod handlers;
pub mod parser;
pub mod presentation;

pub use bootstrap::CliConfig;
pub use error::CliError;
pub use parser::{Cli, Commands, ProbeArgs, RunArgs};
