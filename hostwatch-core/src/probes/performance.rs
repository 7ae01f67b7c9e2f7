use super::{labels, Probe, ProbeSet};

/// Load, memory, disk and CPU figures
pub struct PerformanceProbes;

impl ProbeSet for PerformanceProbes {
    fn category(&self) -> &'static str {
        "performance"
    }

    fn probes(&self) -> Vec<Probe> {
        let category = self.category();
        vec![
            Probe::new(
                labels::LOAD,
                category,
                "uptime 2>/dev/null || (printf 'load average: '; cut -d' ' -f1-3 /proc/loadavg)",
            ),
            Probe::new(
                labels::MEMORY,
                category,
                "free -h 2>/dev/null || grep -E '^(MemTotal|MemAvailable|SwapTotal|SwapFree):' /proc/meminfo",
            ),
            Probe::new(
                labels::DISK,
                category,
                "df -h -x tmpfs -x devtmpfs -x squashfs 2>/dev/null || df -h",
            ),
            Probe::new(
                labels::CPU,
                category,
                "lscpu 2>/dev/null | grep -E '^(Architecture|CPU\\(s\\)|Model name|Thread|Core|Socket)' \
                 || grep -m1 'model name' /proc/cpuinfo",
            ),
        ]
    }
}
