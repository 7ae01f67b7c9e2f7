use super::{labels, Probe, ProbeSet};

pub struct LogProbes;

impl ProbeSet for LogProbes {
    fn category(&self) -> &'static str {
        "logs"
    }

    fn probes(&self) -> Vec<Probe> {
        let category = self.category();
        vec![
            Probe::new(
                labels::SYSTEM_LOG,
                category,
                "sudo -n journalctl -q --no-pager -p warning -n 30 2>/dev/null \
                 || journalctl -q --no-pager -p warning -n 30 2>/dev/null \
                 || tail -n 30 /var/log/syslog /var/log/messages 2>/dev/null \
                 || echo 'System log not readable'",
            ),
            Probe::new(
                labels::KERNEL_LOG,
                category,
                "sudo -n dmesg -T --level=err,warn 2>/dev/null | tail -n 20 \
                 || dmesg 2>/dev/null | tail -n 20 \
                 || echo 'Kernel ring buffer not readable'",
            ),
        ]
    }
}
