//! @ai:module:intent Invoke the Go build tool and capture its diagnostic stream
//! @ai:module:layer infrastructure
//! @ai:module:public_api BuildTool, GoBuild, MockBuildTool
//! @ai:module:depends_on config, error

use crate::config::BuildConfig;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

/// @ai:intent Trait for running an escape-analysis build
pub trait BuildTool: Send + Sync {
    /// @ai:intent Run the build in `dir` and return everything it wrote to stderr
    /// @ai:post the tool's exit status does not affect the result
    /// @ai:effects io
    fn diagnostics(&self, dir: &Path) -> Result<String>;
}

/// @ai:intent Runs `go build -gcflags -m` (or a configured equivalent)
#[derive(Debug, Clone)]
pub struct GoBuild {
    program: String,
    args: Vec<String>,
}

impl GoBuild {
    /// @ai:intent Create a build tool from configuration
    /// @ai:effects pure
    pub fn new(config: &BuildConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// @ai:intent Check if the configured program can be started
    /// @ai:effects io
    pub fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("version")
            .stdin(Stdio::null())
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }
}

impl Default for GoBuild {
    fn default() -> Self {
        Self::new(&BuildConfig::default())
    }
}

impl BuildTool for GoBuild {
    fn diagnostics(&self, dir: &Path) -> Result<String> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| Error::ToolInvocation {
                program: self.program.clone(),
                source: e,
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr);

        tracing::debug!(
            "`{} {}` in {} exited with {}",
            self.program,
            self.args.join(" "),
            dir.display(),
            output.status
        );

        Ok(stderr.into_owned())
    }
}

/// @ai:intent Build tool returning canned diagnostics, for tests and dry runs
pub struct MockBuildTool {
    output: String,
    invocations: AtomicUsize,
    dirs: Mutex<Vec<PathBuf>>,
}

impl MockBuildTool {
    /// @ai:intent Create a mock tool that always reports `output`
    /// @ai:effects pure
    pub fn new(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            invocations: AtomicUsize::new(0),
            dirs: Mutex::new(Vec::new()),
        }
    }

    /// @ai:intent Number of times the tool has been run
    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }

    /// @ai:intent Working directories of every run, oldest first
    pub fn dirs(&self) -> Vec<PathBuf> {
        self.dirs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl BuildTool for MockBuildTool {
    fn diagnostics(&self, dir: &Path) -> Result<String> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        self.dirs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(dir.to_path_buf());
        Ok(self.output.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_program_is_invocation_error() {
        let tool = GoBuild::new(&BuildConfig {
            program: "nonexistent_tool_xyz".to_string(),
            args: vec![],
        });

        let err = tool.diagnostics(Path::new(".")).unwrap_err();
        assert!(matches!(err, Error::ToolInvocation { .. }));
        assert!(!tool.is_available());
    }

    #[test]
    fn test_missing_directory_is_invocation_error() {
        let tool = GoBuild::default();
        let result = tool.diagnostics(Path::new("/definitely/not/a/real/dir"));
        assert!(result.is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_stderr_is_captured_despite_failing_exit() {
        let dir = tempfile::tempdir().unwrap();
        let tool = GoBuild::new(&BuildConfig {
            program: "sh".to_string(),
            args: vec![
                "-c".to_string(),
                "echo './main.go:3:2: x escapes to heap' >&2; exit 1".to_string(),
            ],
        });

        let stderr = tool.diagnostics(dir.path()).unwrap();
        assert_eq!(stderr, "./main.go:3:2: x escapes to heap\n");
    }

    #[test]
    fn test_mock_tool_records_invocations() {
        let tool = MockBuildTool::new("out");

        assert_eq!(tool.diagnostics(Path::new("/a")).unwrap(), "out");
        assert_eq!(tool.diagnostics(Path::new("/b")).unwrap(), "out");
        assert_eq!(tool.invocations(), 2);
        assert_eq!(tool.dirs(), vec![PathBuf::from("/a"), PathBuf::from("/b")]);
    }
}
