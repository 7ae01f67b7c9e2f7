use super::{labels, Probe, ProbeSet};

/// Firewall rule summary.
///
/// Tries ufw, then nftables, then iptables, then firewalld; reading rules
/// needs root, so each is attempted through non-interactive sudo first.
pub struct FirewallProbes;

impl ProbeSet for FirewallProbes {
    fn category(&self) -> &'static str {
        "firewall"
    }

    fn probes(&self) -> Vec<Probe> {
        vec![Probe::new(
            labels::FIREWALL,
            self.category(),
            "(sudo -n ufw status verbose 2>/dev/null | grep -v '^$') \
             || (sudo -n nft list ruleset 2>/dev/null | head -n 60) \
             || (sudo -n iptables -L -n --line-numbers 2>/dev/null | head -n 60) \
             || (firewall-cmd --list-all 2>/dev/null) \
             || echo 'No firewall rules readable (requires root or no firewall installed)'",
        )]
    }
}
