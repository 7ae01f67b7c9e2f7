use super::{labels, Probe, ProbeSet};

/// Filesystem hygiene: world-writable files and set-id binaries.
///
/// Searches stay on the root filesystem and skip pseudo filesystems, with
/// output capped so a sprawling tree cannot flood the report.
pub struct FilesystemProbes;

impl ProbeSet for FilesystemProbes {
    fn category(&self) -> &'static str {
        "filesystem"
    }

    fn probes(&self) -> Vec<Probe> {
        let category = self.category();
        vec![
            Probe::new(
                labels::WORLD_WRITABLE,
                category,
                "(sudo -n find / -xdev -type f -perm -0002 -not -path '/proc/*' -not -path '/sys/*' 2>/dev/null \
                   || find / -xdev -type f -perm -0002 -not -path '/proc/*' -not -path '/sys/*' 2>/dev/null) \
                 | head -n 30; true",
            ),
            Probe::new(
                labels::SUID_SGID,
                category,
                "(sudo -n find / -xdev -type f \\( -perm -4000 -o -perm -2000 \\) 2>/dev/null \
                   || find / -xdev -type f \\( -perm -4000 -o -perm -2000 \\) 2>/dev/null) \
                 | head -n 40; true",
            ),
        ]
    }
}
