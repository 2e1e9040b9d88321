//! Backend launch contract: preflight, search path and command line.

use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use dmsender_core::{ShellSettings, SupervisorError};
use tokio::process::Command;

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Everything needed to spawn one backend lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub executable: PathBuf,
    pub artifact: PathBuf,
    /// Arguments placed between the executable and the artifact.
    pub leading_args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    pub log_path: PathBuf,
}

impl LaunchSpec {
    pub fn new(
        executable: impl Into<PathBuf>,
        artifact: impl Into<PathBuf>,
        log_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            executable: executable.into(),
            artifact: artifact.into(),
            leading_args: vec!["-jar".to_string()],
            working_dir: None,
            log_path: log_path.into(),
        }
    }

    /// Build from settings with an already-resolved log path.
    pub fn from_settings(settings: &ShellSettings, log_path: impl Into<PathBuf>) -> Self {
        Self {
            executable: settings.executable.clone(),
            artifact: settings.artifact.clone(),
            leading_args: settings.leading_args.clone(),
            working_dir: None,
            log_path: log_path.into(),
        }
    }

    #[must_use]
    pub fn with_leading_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Full argument list: leading args followed by the artifact.
    pub fn args(&self) -> Vec<OsString> {
        self.leading_args
            .iter()
            .map(OsString::from)
            .chain(std::iter::once(self.artifact.clone().into_os_string()))
            .collect()
    }

    /// Check that both the executable and the artifact exist.
    pub fn preflight(&self) -> Result<(), SupervisorError> {
        if !self.executable.exists() {
            return Err(SupervisorError::ExecutableMissing {
                path: self.executable.clone(),
            });
        }
        if !self.artifact.exists() {
            return Err(SupervisorError::ArtifactMissing {
                path: self.artifact.clone(),
            });
        }
        Ok(())
    }

    /// Inherited search path with the executable's directory in front.
    pub fn search_path(&self) -> Result<OsString, SupervisorError> {
        prepend_search_path(
            self.executable.parent(),
            env::var_os("PATH").unwrap_or_default(),
        )
    }

    /// Spawn-ready command: stdin null, stdout/stderr piped, no console
    /// window on Windows.
    pub fn build_command(&self) -> Result<Command, SupervisorError> {
        let mut cmd = Command::new(&self.executable);
        cmd.args(self.args())
            .env("PATH", self.search_path()?)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        #[cfg(windows)]
        cmd.creation_flags(CREATE_NO_WINDOW);

        Ok(cmd)
    }
}

fn prepend_search_path(dir: Option<&Path>, inherited: OsString) -> Result<OsString, SupervisorError> {
    let Some(dir) = dir.filter(|d| !d.as_os_str().is_empty()) else {
        return Ok(inherited);
    };
    let paths = std::iter::once(dir.to_path_buf()).chain(env::split_paths(&inherited));
    env::join_paths(paths).map_err(|e| SupervisorError::SearchPath(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_place_artifact_last() {
        let spec = LaunchSpec::new("/opt/jre/bin/java", "/opt/app.jar", "/tmp/x.log");
        assert_eq!(
            spec.args(),
            vec![OsString::from("-jar"), OsString::from("/opt/app.jar")]
        );

        let spec = spec.with_leading_args(["-Xmx512m", "-jar"]);
        assert_eq!(
            spec.args(),
            vec![
                OsString::from("-Xmx512m"),
                OsString::from("-jar"),
                OsString::from("/opt/app.jar")
            ]
        );
    }

    #[test]
    fn preflight_reports_missing_executable_first() {
        let dir = tempfile::tempdir().unwrap();
        let spec = LaunchSpec::new(
            dir.path().join("java"),
            dir.path().join("app.jar"),
            dir.path().join("x.log"),
        );
        assert!(matches!(
            spec.preflight(),
            Err(SupervisorError::ExecutableMissing { .. })
        ));
    }

    #[test]
    fn preflight_reports_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let java = dir.path().join("java");
        std::fs::write(&java, b"").unwrap();
        let spec = LaunchSpec::new(&java, dir.path().join("app.jar"), dir.path().join("x.log"));
        assert!(matches!(
            spec.preflight(),
            Err(SupervisorError::ArtifactMissing { .. })
        ));

        std::fs::write(dir.path().join("app.jar"), b"").unwrap();
        assert!(spec.preflight().is_ok());
    }

    #[test]
    fn search_path_puts_executable_dir_first() {
        let inherited = env::join_paths([PathBuf::from("/usr/bin"), PathBuf::from("/bin")]).unwrap();
        let joined = prepend_search_path(Some(Path::new("/opt/jre/bin")), inherited).unwrap();
        let parts: Vec<PathBuf> = env::split_paths(&joined).collect();
        assert_eq!(
            parts,
            vec![
                PathBuf::from("/opt/jre/bin"),
                PathBuf::from("/usr/bin"),
                PathBuf::from("/bin")
            ]
        );
    }

    #[test]
    fn search_path_unchanged_without_parent() {
        let inherited = OsString::from("/usr/bin");
        let joined = prepend_search_path(Some(Path::new("")), inherited.clone()).unwrap();
        assert_eq!(joined, inherited);
    }
}
