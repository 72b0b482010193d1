//! External tool lookup and invocation.
//!
//! Tools are resolved with `which` when they are invoked, not at startup, so a
//! run that fails early never needs them installed.

use super::error::{Error, Result};
use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
    process::Stdio,
};

/// An external executable, by name or path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tool {
    name: &'static str,
    program: PathBuf,
}

impl Tool {
    /// Creates a tool. `program` may be a bare name looked up on `PATH` or a
    /// path to an executable.
    pub fn new(name: &'static str, program: impl Into<PathBuf>) -> Self {
        Self {
            name,
            program: program.into(),
        }
    }

    /// Resolves the program to an executable path.
    pub fn resolve(&self) -> Result<PathBuf> {
        match which::which(&self.program) {
            Ok(path) => {
                log::debug!("Found {} at: {}", self.name, path.display());
                Ok(path)
            }
            Err(e) => Err(Error::ToolNotFound {
                tool: self.program.display().to_string(),
                reason: e.to_string(),
            }),
        }
    }

    /// Runs the tool to completion.
    ///
    /// Output is captured and logged; a non-zero exit becomes
    /// [`Error::ToolFailed`] carrying stderr. The child is killed if the
    /// returned future is dropped.
    pub async fn run<I, S>(&self, args: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let program = self.resolve()?;
        let args: Vec<_> = args.into_iter().map(|a| a.as_ref().to_os_string()).collect();
        let command_line = format!(
            "{} {}",
            program.display(),
            args.iter()
                .map(|a| a.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ")
        );
        log::debug!("Running {}", command_line);

        let output = tokio::process::Command::new(&program)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|error| Error::CommandFailed {
                command: command_line.clone(),
                error,
            })?;

        for line in String::from_utf8_lossy(&output.stdout).lines() {
            log::debug!("[{}] {}", self.name, line);
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        for line in stderr.lines() {
            log::debug!("[{} stderr] {}", self.name, line);
        }

        if !output.status.success() {
            return Err(Error::ToolFailed {
                tool: self.name.to_string(),
                code: output.status.code(),
                stderr: stderr.trim().to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_tool_is_reported() {
        let tool = Tool::new("imagetool", "definitely-not-a-real-tool-7f3a");
        let err = tool.resolve().unwrap_err();
        assert!(matches!(err, Error::ToolNotFound { .. }));
        assert!(err.to_string().starts_with("definitely-not-a-real-tool-7f3a not found"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_carries_stderr() {
        let tool = Tool::new("sh", "sh");
        let err = tool.run(["-c", "echo broken >&2; exit 3"]).await.unwrap_err();
        match err {
            Error::ToolFailed { tool, code, stderr } => {
                assert_eq!(tool, "sh");
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "broken");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn successful_run() {
        Tool::new("true", "true").run(Vec::<String>::new()).await.unwrap();
    }
}
