//! CLI bootstrap: settings resolution for the composition root.
//!
//! Precedence, lowest first: built-in defaults, `DMSENDER_*` environment
//! variables (including those loaded from `.env`), command-line flags.

use std::env;
use std::path::PathBuf;

use dmsender_core::paths::{data_root_with, logs_dir};
use dmsender_core::{ShellSettings, backend_log_path, validate_settings};

use crate::error::CliError;
use crate::parser::{ProbeArgs, RunArgs};

/// Resolved configuration for one CLI invocation.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub settings: ShellSettings,
    pub data_root: PathBuf,
    /// Backend log sink, resolved against the data root when unset.
    pub log_path: PathBuf,
}

impl CliConfig {
    /// Resolve configuration for `run` from the process environment.
    pub fn for_run(args: &RunArgs) -> Result<Self, CliError> {
        Self::load_with(|var| env::var(var).ok(), |settings| args.apply(settings))
    }

    /// Resolve configuration for `probe` from the process environment.
    pub fn for_probe(args: &ProbeArgs) -> Result<Self, CliError> {
        Self::load_with(|var| env::var(var).ok(), |settings| args.apply(settings))
    }

    /// Resolve configuration with an injected environment lookup.
    pub fn load_with<L, O>(lookup: L, overrides: O) -> Result<Self, CliError>
    where
        L: Fn(&str) -> Option<String>,
        O: FnOnce(&mut ShellSettings),
    {
        let mut settings = ShellSettings::with_defaults();
        settings.apply_env(&lookup)?;
        overrides(&mut settings);
        validate_settings(&settings)?;

        let data_root = data_root_with(&lookup)?;
        let log_path = settings
            .log_path
            .clone()
            .unwrap_or_else(|| backend_log_path(&data_root));

        Ok(Self {
            settings,
            data_root,
            log_path,
        })
    }

    /// Directory for the shell's own rolling logs.
    pub fn logs_dir(&self) -> PathBuf {
        logs_dir(&self.data_root)
    }
}
