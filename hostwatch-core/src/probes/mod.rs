pub mod accounts;
pub mod cron;
pub mod filesystem;
pub mod firewall;
pub mod logs;
pub mod network;
pub mod packages;
pub mod performance;
pub mod processes;
pub mod services;
pub mod ssh;
pub mod system_info;

use crate::builder::AuditLogBuilder;
use crate::error::AuditError;
use crate::transport::Transport;
use crate::types::ProbeResult;
use std::time::Instant;

/// Section labels the signal extractor looks up
pub mod labels {
    pub const SYSTEM_INFO: &str = "System Information";
    pub const LOAD: &str = "Load Average";
    pub const MEMORY: &str = "Memory Usage";
    pub const DISK: &str = "Disk Usage";
    pub const CPU: &str = "CPU Information";
    pub const TOP_CPU: &str = "Top Processes by CPU";
    pub const TOP_MEMORY: &str = "Top Processes by Memory";
    pub const PROCESS_COUNT: &str = "Process Count";
    pub const LISTENING: &str = "Listening Sockets";
    pub const CONNECTIONS: &str = "Active Connections";
    pub const FIREWALL: &str = "Firewall Rules";
    pub const SHELL_ACCOUNTS: &str = "Shell Accounts";
    pub const PRIVILEGED: &str = "Privileged Group Members";
    pub const RECENT_LOGINS: &str = "Recent Logins";
    pub const FAILED_LOGINS: &str = "Failed Logins";
    pub const ACTIVE_SERVICES: &str = "Active Services";
    pub const FAILED_SERVICES: &str = "Failed Services";
    pub const SECURITY_UPDATES: &str = "Pending Security Updates";
    pub const SSH_CONFIG: &str = "SSH Configuration";
    pub const USER_CRONTAB: &str = "User Crontab";
    pub const SYSTEM_CRON: &str = "System Cron Jobs";
    pub const SYSTEM_LOG: &str = "System Log";
    pub const KERNEL_LOG: &str = "Kernel Messages";
    pub const WORLD_WRITABLE: &str = "World-Writable Files";
    pub const SUID_SGID: &str = "SUID/SGID Binaries";
}

/// A single diagnostic command captured as one report section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Probe {
    pub label: &'static str,
    pub category: &'static str,
    pub command: &'static str,
}

impl Probe {
    pub const fn new(label: &'static str, category: &'static str, command: &'static str) -> Self {
        Self {
            label,
            category,
            command,
        }
    }
}

/// A category of probes contributing to the battery
pub trait ProbeSet {
    /// Get the category name for this set
    fn category(&self) -> &'static str;

    /// Probes of this category, in report order
    fn probes(&self) -> Vec<Probe>;
}

/// Categories in report order
pub fn standard_sets() -> Vec<Box<dyn ProbeSet>> {
    vec![
        Box::new(system_info::SystemInfoProbes),
        Box::new(performance::PerformanceProbes),
        Box::new(processes::ProcessProbes),
        Box::new(network::NetworkProbes),
        Box::new(firewall::FirewallProbes),
        Box::new(accounts::AccountsProbes),
        Box::new(services::ServicesProbes),
        Box::new(packages::PackagesProbes),
        Box::new(ssh::SshProbes),
        Box::new(cron::CronProbes),
        Box::new(logs::LogProbes),
        Box::new(filesystem::FilesystemProbes),
    ]
}

/// Fixed, ordered catalog of probes run against every host.
///
/// Probes run one after another; a failing probe is recorded with a
/// placeholder and the battery moves on.
pub struct ProbeBattery {
    probes: Vec<Probe>,
}

impl ProbeBattery {
    pub fn new(probes: Vec<Probe>) -> Self {
        Self { probes }
    }

    /// The full catalog
    pub fn standard() -> Self {
        let probes = standard_sets()
            .iter()
            .flat_map(|set| set.probes())
            .collect();
        Self::new(probes)
    }

    pub fn probes(&self) -> &[Probe] {
        &self.probes
    }

    pub fn find(&self, label: &str) -> Option<&Probe> {
        self.probes.iter().find(|p| p.label == label)
    }

    /// Run every probe through the transport and record the results
    pub fn run(&self, transport: &dyn Transport, builder: &mut AuditLogBuilder) {
        for probe in &self.probes {
            let started = Instant::now();

            let result = match transport.run(probe.command) {
                Ok(output) => ProbeResult::succeeded(probe.label, output),
                Err(e) => {
                    let reason = match e {
                        AuditError::ProbeExecution(reason) => reason,
                        other => other.to_string(),
                    };
                    tracing::warn!(probe = probe.label, %reason, "probe failed");
                    ProbeResult::failed(probe.label, &reason)
                }
            };

            tracing::debug!(
                probe = probe.label,
                success = result.success,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "probe finished"
            );
            builder.record(result);
        }
    }
}

impl Default for ProbeBattery {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::types::HostProfile;
    use chrono::Utc;
    use std::cell::RefCell;
    use std::collections::HashSet;

    struct FlakyTransport {
        calls: RefCell<Vec<String>>,
    }

    impl Transport for FlakyTransport {
        fn run(&self, command: &str) -> Result<String> {
            let mut calls = self.calls.borrow_mut();
            calls.push(command.to_string());
            if calls.len() % 2 == 0 {
                Err(AuditError::ProbeExecution("connection reset".to_string()))
            } else {
                Ok("ok".to_string())
            }
        }

        fn describe(&self) -> String {
            "flaky".to_string()
        }
    }

    #[test]
    fn labels_are_unique() {
        let battery = ProbeBattery::standard();
        let labels: HashSet<&str> = battery.probes().iter().map(|p| p.label).collect();
        assert_eq!(labels.len(), battery.probes().len());
    }

    #[test]
    fn catalog_covers_every_extracted_section() {
        let battery = ProbeBattery::standard();
        for label in [
            labels::LOAD,
            labels::FAILED_LOGINS,
            labels::FAILED_SERVICES,
            labels::SECURITY_UPDATES,
            labels::LISTENING,
        ] {
            assert!(battery.find(label).is_some(), "missing probe {}", label);
        }
    }

    #[test]
    fn catalog_starts_with_identity_and_ends_with_filesystem() {
        let battery = ProbeBattery::standard();
        let probes = battery.probes();
        assert_eq!(probes.first().map(|p| p.label), Some(labels::SYSTEM_INFO));
        assert_eq!(probes.last().map(|p| p.category), Some("filesystem"));
    }

    #[test]
    fn failures_do_not_stop_the_battery() {
        let battery = ProbeBattery::standard();
        let transport = FlakyTransport {
            calls: RefCell::new(Vec::new()),
        };
        let profile = HostProfile::new("web1", "192.0.2.10", "audit", "ops@example.com");
        let mut builder = AuditLogBuilder::new(&profile, Utc::now());

        battery.run(&transport, &mut builder);
        let report = builder.build();

        assert_eq!(transport.calls.borrow().len(), battery.probes().len());
        assert_eq!(report.sections.len(), battery.probes().len());
        assert!(report.failed_sections() > 0);

        for (section, probe) in report.sections.iter().zip(battery.probes()) {
            assert_eq!(section.label, probe.label);
        }
        let second = &report.sections[1];
        assert!(!second.success);
        assert_eq!(second.output, "[probe failed: connection reset]");
    }
}
