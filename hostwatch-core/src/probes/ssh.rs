use super::{labels, Probe, ProbeSet};

/// SSH daemon hardening settings
pub struct SshProbes;

impl ProbeSet for SshProbes {
    fn category(&self) -> &'static str {
        "ssh"
    }

    fn probes(&self) -> Vec<Probe> {
        vec![Probe::new(
            labels::SSH_CONFIG,
            self.category(),
            "(sudo -n sshd -T 2>/dev/null \
               || grep -hvE '^[[:space:]]*(#|$)' /etc/ssh/sshd_config /etc/ssh/sshd_config.d/*.conf 2>/dev/null) \
             | grep -iE '^(port|permitrootlogin|passwordauthentication|permitemptypasswords|pubkeyauthentication|x11forwarding|maxauthtries|allowusers|allowgroups|ciphers|macs)' \
             || echo 'SSH daemon configuration not readable'",
        )]
    }
}
