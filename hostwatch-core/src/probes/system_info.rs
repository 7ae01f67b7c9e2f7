use super::{labels, Probe, ProbeSet};

/// System identification: kernel, distribution and uptime
pub struct SystemInfoProbes;

impl ProbeSet for SystemInfoProbes {
    fn category(&self) -> &'static str {
        "system"
    }

    fn probes(&self) -> Vec<Probe> {
        vec![Probe::new(
            labels::SYSTEM_INFO,
            self.category(),
            "uname -a; \
             (grep -E '^(NAME|VERSION|ID)=' /etc/os-release 2>/dev/null || echo 'os-release not available'); \
             (uptime -p 2>/dev/null || uptime)",
        )]
    }
}
