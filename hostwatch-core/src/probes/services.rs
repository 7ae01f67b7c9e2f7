use super::{labels, Probe, ProbeSet};

/// Systemd service health
pub struct ServicesProbes;

impl ProbeSet for ServicesProbes {
    fn category(&self) -> &'static str {
        "services"
    }

    fn probes(&self) -> Vec<Probe> {
        let category = self.category();
        vec![
            Probe::new(
                labels::ACTIVE_SERVICES,
                category,
                "systemctl list-units --type=service --state=running --no-legend --no-pager 2>/dev/null \
                 || service --status-all 2>/dev/null \
                 || echo 'Service manager not available'",
            ),
            Probe::new(
                labels::FAILED_SERVICES,
                category,
                "systemctl --failed --no-legend --no-pager 2>/dev/null || echo 'Service manager not available'",
            ),
        ]
    }
}
