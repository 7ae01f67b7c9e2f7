use super::{labels, Probe, ProbeSet};

pub struct ProcessProbes;

impl ProbeSet for ProcessProbes {
    fn category(&self) -> &'static str {
        "processes"
    }

    fn probes(&self) -> Vec<Probe> {
        let category = self.category();
        vec![
            Probe::new(labels::TOP_CPU, category, "ps aux --sort=-%cpu 2>/dev/null | head -n 11"),
            Probe::new(labels::TOP_MEMORY, category, "ps aux --sort=-%mem 2>/dev/null | head -n 11"),
            Probe::new(labels::PROCESS_COUNT, category, "ps -e --no-headers 2>/dev/null | wc -l"),
        ]
    }
}
