use super::{collect_output, RemoteConnector, Transport};
use crate::error::{AuditError, Result};
use crate::types::HostProfile;
use std::process::Command;
use std::time::Duration;

/// Exit status the OpenSSH client uses for its own failures
const SSH_FAILURE: i32 = 255;

/// Runs probes on a remote host through the OpenSSH client.
///
/// IPv4 is forced, authentication never prompts and only the connect phase
/// is bounded by a timeout.
#[derive(Debug, Clone)]
pub struct SshTransport {
    address: String,
    port: u16,
    principal: String,
    connect_timeout: Duration,
}

impl SshTransport {
    pub fn new(profile: &HostProfile, connect_timeout: Duration) -> Self {
        Self {
            address: profile.address.clone(),
            port: profile.port,
            principal: profile.principal.clone(),
            connect_timeout,
        }
    }

    fn destination(&self) -> String {
        format!("{}@{}", self.principal, self.address)
    }

    /// Arguments passed to `ssh` for one command
    pub fn ssh_args(&self, command: &str) -> Vec<String> {
        vec![
            "-4".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", self.connect_timeout.as_secs().max(1)),
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            "LogLevel=ERROR".to_string(),
            "-p".to_string(),
            self.port.to_string(),
            self.destination(),
            command.to_string(),
        ]
    }
}

impl Transport for SshTransport {
    fn run(&self, command: &str) -> Result<String> {
        tracing::debug!(destination = %self.destination(), %command, "running remote probe");

        let output = Command::new("ssh")
            .args(self.ssh_args(command))
            .output()
            .map_err(|e| AuditError::ProbeExecution(format!("failed to start ssh: {}", e)))?;

        if output.status.code() == Some(SSH_FAILURE) {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::warn!(destination = %self.destination(), %stderr, "ssh connection failed");
            return Err(AuditError::ProbeExecution(format!(
                "ssh to {}:{} failed: {}",
                self.address, self.port, stderr
            )));
        }

        collect_output(output)
    }

    fn describe(&self) -> String {
        format!("ssh {}:{}", self.destination(), self.port)
    }
}

/// Opens `SshTransport`s with a shared connect timeout
#[derive(Debug, Clone)]
pub struct SshConnector {
    connect_timeout: Duration,
}

impl SshConnector {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl RemoteConnector for SshConnector {
    fn connect(&self, profile: &HostProfile) -> Box<dyn Transport> {
        Box::new(SshTransport::new(profile, self.connect_timeout))
    }
}
