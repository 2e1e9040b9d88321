//! Main CLI parser and top-level argument handling.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use dmsender_core::ShellSettings;

/// Desktop shell for the Danmaku Sender backend.
///
/// Without a subcommand the shell behaves like `dmsender run`.
#[derive(Debug, Parser)]
#[command(name = "dmsender")]
#[command(about = "Launch the Danmaku Sender backend and wait until it is ready")]
#[command(version)]
pub struct Cli {
    /// Enable verbose/debug output (also echoes raw backend output)
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Commands {
    /// Start the backend, follow its startup and keep it running
    Run(RunArgs),
    /// Check once whether the backend port accepts connections
    Probe(ProbeArgs),
}

impl Default for Commands {
    fn default() -> Self {
        Self::Run(RunArgs::default())
    }
}

/// Overrides for `run`. Unset flags fall back to `DMSENDER_*` variables and
/// then to built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Args)]
pub struct RunArgs {
    /// Java executable used to launch the backend
    #[arg(long)]
    pub java: Option<PathBuf>,

    /// Backend jar
    #[arg(long)]
    pub jar: Option<PathBuf>,

    /// Backend log file (appended to)
    #[arg(long = "log-path")]
    pub log_path: Option<PathBuf>,

    /// Backend port to probe
    #[arg(long)]
    pub port: Option<u16>,

    /// Connection attempts before giving up
    #[arg(long = "max-attempts")]
    pub max_attempts: Option<u32>,
}

impl RunArgs {
    /// Apply the flags that were given on top of `settings`.
    pub fn apply(&self, settings: &mut ShellSettings) {
        if let Some(java) = &self.java {
            settings.executable.clone_from(java);
        }
        if let Some(jar) = &self.jar {
            settings.artifact.clone_from(jar);
        }
        if let Some(log_path) = &self.log_path {
            settings.log_path = Some(log_path.clone());
        }
        if let Some(port) = self.port {
            settings.backend_port = port;
        }
        if let Some(max_attempts) = self.max_attempts {
            settings.max_attempts = max_attempts;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Args)]
pub struct ProbeArgs {
    /// Host to connect to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to connect to
    #[arg(long)]
    pub port: Option<u16>,
}

impl ProbeArgs {
    pub fn apply(&self, settings: &mut ShellSettings) {
        if let Some(host) = &self.host {
            settings.backend_host.clone_from(host);
        }
        if let Some(port) = self.port {
            settings.backend_port = port;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_defaults_to_run() {
        let cli = Cli::parse_from(["dmsender"]);
        assert!(!cli.verbose);
        assert_eq!(cli.command.unwrap_or_default(), Commands::Run(RunArgs::default()));
    }

    #[test]
    fn test_run_overrides() {
        let cli = Cli::parse_from([
            "dmsender",
            "-v",
            "run",
            "--java",
            "/opt/jre/bin/java",
            "--port",
            "9010",
            "--max-attempts",
            "3",
        ]);
        assert!(cli.verbose);
        let Some(Commands::Run(args)) = cli.command else {
            panic!("expected run");
        };

        let mut settings = ShellSettings::with_defaults();
        args.apply(&mut settings);
        assert_eq!(settings.executable, PathBuf::from("/opt/jre/bin/java"));
        assert_eq!(settings.backend_port, 9010);
        assert_eq!(settings.max_attempts, 3);
        // untouched
        assert_eq!(settings.artifact, PathBuf::from("app.jar"));
    }

    #[test]
    fn test_probe_args() {
        let cli = Cli::parse_from(["dmsender", "probe", "--port", "8080"]);
        let Some(Commands::Probe(args)) = cli.command else {
            panic!("expected probe");
        };
        let mut settings = ShellSettings::with_defaults();
        args.apply(&mut settings);
        assert_eq!(settings.backend_port, 8080);
        assert_eq!(settings.backend_host, "127.0.0.1");
    }

    #[test]
    fn test_verbose_is_global() {
        let cli = Cli::parse_from(["dmsender", "probe", "--verbose"]);
        assert!(cli.verbose);
    }
}
