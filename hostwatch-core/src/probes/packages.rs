use super::{labels, Probe, ProbeSet};

/// Pending security updates.
///
/// Reads the package manager's cached metadata only; no refresh is
/// triggered on the audited host.
pub struct PackagesProbes;

impl ProbeSet for PackagesProbes {
    fn category(&self) -> &'static str {
        "packages"
    }

    fn probes(&self) -> Vec<Probe> {
        vec![Probe::new(
            labels::SECURITY_UPDATES,
            self.category(),
            "if command -v apt >/dev/null 2>&1; then \
               apt list --upgradable 2>/dev/null | grep -i -- '-security'; \
             elif command -v dnf >/dev/null 2>&1; then \
               dnf -q updateinfo list --security 2>/dev/null; \
             elif command -v yum >/dev/null 2>&1; then \
               yum -q updateinfo list security 2>/dev/null; \
             elif command -v zypper >/dev/null 2>&1; then \
               zypper -q list-patches --category security 2>/dev/null; \
             else \
               echo 'No supported package manager found'; \
             fi; true",
        )]
    }
}
