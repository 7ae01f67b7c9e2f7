use super::{collect_output, Transport};
use crate::error::{AuditError, Result};
use std::process::Command;

/// Runs probes through the local shell
#[derive(Debug, Clone)]
pub struct LocalShell {
    shell: String,
}

impl LocalShell {
    pub fn new() -> Self {
        Self {
            shell: "sh".to_string(),
        }
    }

    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }
}

impl Default for LocalShell {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for LocalShell {
    fn run(&self, command: &str) -> Result<String> {
        tracing::debug!(%command, "running local probe");

        let output = Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .output()
            .map_err(|e| AuditError::ProbeExecution(format!("failed to start {}: {}", self.shell, e)))?;

        collect_output(output)
    }

    fn describe(&self) -> String {
        "local".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_stdout_of_successful_command() {
        let out = LocalShell::new().run("echo hello; echo world").unwrap();
        assert_eq!(out, "hello\nworld");
    }

    #[test]
    fn non_zero_exit_reports_stderr() {
        let err = LocalShell::new().run("echo broken >&2; exit 3").unwrap_err();
        match err {
            AuditError::ProbeExecution(reason) => assert_eq!(reason, "broken"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_shell_is_a_probe_error() {
        let err = LocalShell::new()
            .with_shell("/nonexistent/shell")
            .run("true")
            .unwrap_err();
        assert!(matches!(err, AuditError::ProbeExecution(_)));
    }
}
