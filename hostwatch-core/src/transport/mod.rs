pub mod identity;
pub mod local;
pub mod remote;

pub use identity::{LocalIdentity, Route};
pub use local::LocalShell;
pub use remote::{SshConnector, SshTransport};

use crate::error::{AuditError, Result};
use crate::types::HostProfile;
use std::process::Output;

/// Executes probe commands against one host.
///
/// A non-zero exit, a spawn failure or a connection failure is reported as
/// `AuditError::ProbeExecution` carrying the captured error text.
pub trait Transport {
    /// Run a shell command and return its standard output
    fn run(&self, command: &str) -> Result<String>;

    /// Short description for report headers and logs
    fn describe(&self) -> String;
}

/// Opens remote transports for hosts that are not the local machine
pub trait RemoteConnector {
    fn connect(&self, profile: &HostProfile) -> Box<dyn Transport>;
}

/// Chooses between local and remote execution, once per host.
///
/// The local identity is detected once and reused for every host of a run.
pub struct TransportSelector {
    identity: LocalIdentity,
    remote: Box<dyn RemoteConnector>,
}

impl TransportSelector {
    pub fn new(identity: LocalIdentity, remote: Box<dyn RemoteConnector>) -> Self {
        Self { identity, remote }
    }

    pub fn select(&self, profile: &HostProfile) -> (Route, Box<dyn Transport>) {
        let route = self.identity.route(&profile.address);
        let transport: Box<dyn Transport> = match route {
            Route::Local => Box::new(LocalShell::new()),
            Route::Remote => self.remote.connect(profile),
        };
        tracing::debug!(host = %profile.name, ?route, transport = %transport.describe(), "transport selected");
        (route, transport)
    }
}

/// Turn a finished process into probe output or a probe error
pub(crate) fn collect_output(output: Output) -> Result<String> {
    let stdout = String::from_utf8_lossy(&output.stdout).trim_end().to_string();

    if output.status.success() {
        return Ok(stdout);
    }

    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    let reason = match (stderr.is_empty(), output.status.code()) {
        (false, _) => stderr,
        (true, Some(code)) if !stdout.is_empty() => format!("exit status {}: {}", code, stdout),
        (true, Some(code)) => format!("exit status {}", code),
        (true, None) => "terminated by signal".to_string(),
    };

    Err(AuditError::ProbeExecution(reason))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct CountingConnector {
        calls: Rc<Cell<usize>>,
    }

    impl RemoteConnector for CountingConnector {
        fn connect(&self, profile: &HostProfile) -> Box<dyn Transport> {
            self.calls.set(self.calls.get() + 1);
            Box::new(SshTransport::new(profile, std::time::Duration::from_secs(5)))
        }
    }

    fn selector(calls: Rc<Cell<usize>>) -> TransportSelector {
        let identity = LocalIdentity::new(
            "auditbox",
            Some("auditbox.example.com".to_string()),
            Some("10.1.1.1".parse().unwrap()),
        );
        TransportSelector::new(identity, Box::new(CountingConnector { calls }))
    }

    #[test]
    fn own_hostname_never_reaches_remote_connector() {
        let calls = Rc::new(Cell::new(0));
        let selector = selector(calls.clone());

        for address in ["auditbox", "AUDITBOX.example.com", "localhost", "10.1.1.1"] {
            let profile = HostProfile::new("self", address, "audit", "ops@example.com");
            let (route, transport) = selector.select(&profile);
            assert_eq!(route, Route::Local, "{} should be local", address);
            assert_eq!(transport.describe(), "local");
        }

        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn other_address_uses_remote_connector() {
        let calls = Rc::new(Cell::new(0));
        let selector = selector(calls.clone());

        let profile = HostProfile::new("web1", "192.0.2.10", "audit", "ops@example.com");
        let (route, transport) = selector.select(&profile);

        assert_eq!(route, Route::Remote);
        assert_eq!(transport.describe(), "ssh audit@192.0.2.10:22");
        assert_eq!(calls.get(), 1);
    }
}
