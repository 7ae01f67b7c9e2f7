use super::{labels, Probe, ProbeSet};

/// Scheduled tasks at user and system level
pub struct CronProbes;

impl ProbeSet for CronProbes {
    fn category(&self) -> &'static str {
        "cron"
    }

    fn probes(&self) -> Vec<Probe> {
        let category = self.category();
        vec![
            Probe::new(
                labels::USER_CRONTAB,
                category,
                "crontab -l 2>/dev/null | grep -vE '^[[:space:]]*(#|$)' || echo 'No user crontab'",
            ),
            Probe::new(
                labels::SYSTEM_CRON,
                category,
                "grep -hvE '^[[:space:]]*(#|$)' /etc/crontab /etc/cron.d/* 2>/dev/null; \
                 ls /etc/cron.daily /etc/cron.weekly /etc/cron.monthly 2>/dev/null; \
                 systemctl list-timers --all --no-pager --no-legend 2>/dev/null | head -n 20; true",
            ),
        ]
    }
}
