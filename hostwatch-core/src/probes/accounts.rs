use super::{labels, Probe, ProbeSet};

/// Authentication failures from exactly one source: the sshd journal when
/// it has matches, otherwise the auth log files. Each file is read once,
/// with sudo when allowed and directly when readable.
pub const FAILED_LOGINS_COMMAND: &str = "p='Failed password|Failed publickey|authentication failure|Invalid user|FAILED LOGIN'; \
    logs=\"${HOSTWATCH_AUTH_LOGS:-/var/log/auth.log /var/log/secure}\"; \
    m=$( { sudo -n journalctl -q --no-pager -u ssh -u sshd --since '-7 days' 2>/dev/null \
    || journalctl -q --no-pager -u ssh -u sshd --since '-7 days' 2>/dev/null; } | grep -a -E \"$p\"); \
    if [ -z \"$m\" ]; then \
    m=$(for f in $logs; do sudo -n cat \"$f\" 2>/dev/null || { [ -r \"$f\" ] && cat \"$f\"; }; done | grep -a -E \"$p\"); \
    fi; \
    [ -n \"$m\" ] && printf '%s\\n' \"$m\" | tail -n 50; true";

/// Identity and access: login-capable accounts, privileged groups, recent
/// and failed logins
pub struct AccountsProbes;

impl ProbeSet for AccountsProbes {
    fn category(&self) -> &'static str {
        "accounts"
    }

    fn probes(&self) -> Vec<Probe> {
        let category = self.category();
        vec![
            Probe::new(
                labels::SHELL_ACCOUNTS,
                category,
                "getent passwd 2>/dev/null | awk -F: '$7 !~ /(nologin|false|sync|halt|shutdown)$/ {print $1\" uid=\"$3\" shell=\"$7}' \
                 || echo 'Account database not readable'",
            ),
            Probe::new(
                labels::PRIVILEGED,
                category,
                "for g in root sudo wheel admin adm; do getent group \"$g\" 2>/dev/null; done; \
                 (sudo -n grep -rhE '^[^#].*NOPASSWD' /etc/sudoers /etc/sudoers.d 2>/dev/null | sed 's/^/NOPASSWD: /'); true",
            ),
            Probe::new(
                labels::RECENT_LOGINS,
                category,
                "last -n 15 -a 2>/dev/null | grep -v '^$' || echo 'Login history not available'",
            ),
            Probe::new(
                labels::FAILED_LOGINS,
                category,
                FAILED_LOGINS_COMMAND,
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{LocalShell, Transport};
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    const AUTH_LOG: &str = "\
Oct 19 02:11:01 web1 sshd[811]: Failed password for root from 203.0.113.7 port 52110 ssh2
Oct 19 02:11:05 web1 sshd[812]: Accepted publickey for audit from 192.0.2.1 port 40022 ssh2
Oct 19 02:11:09 web1 sshd[813]: Invalid user admin from 203.0.113.7 port 52114
";

    fn stub(bin: &Path, name: &str, body: &str) {
        let path = bin.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    fn run_failed_logins(dir: &Path) -> String {
        let command = format!(
            "export PATH=\"{bin}:$PATH\"; export HOSTWATCH_AUTH_LOGS=\"{dir}/auth.log {dir}/secure\"; {cmd}",
            bin = dir.join("bin").display(),
            dir = dir.display(),
            cmd = FAILED_LOGINS_COMMAND,
        );
        LocalShell::new().run(&command).unwrap()
    }

    fn fixture(journal: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("bin");
        std::fs::create_dir(&bin).unwrap();
        stub(&bin, "sudo", "exit 1");
        stub(&bin, "journalctl", journal);
        std::fs::write(dir.path().join("auth.log"), AUTH_LOG).unwrap();
        dir
    }

    #[test]
    fn readable_log_is_counted_once_when_other_log_is_missing() {
        let dir = fixture("exit 1");

        let out = run_failed_logins(dir.path());

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2, "{}", out);
        assert!(lines[0].contains("Failed password for root"));
        assert!(lines[1].contains("Invalid user admin"));
    }

    #[test]
    fn journal_without_matches_falls_back_to_files() {
        let dir = fixture("echo 'Oct 19 02:00:00 web1 sshd[700]: Server listening on 0.0.0.0 port 22.'");

        let out = run_failed_logins(dir.path());

        assert_eq!(out.lines().count(), 2, "{}", out);
    }

    #[test]
    fn journal_matches_are_used_alone() {
        let dir = fixture("echo 'Oct 19 03:00:00 web1 sshd[900]: Failed publickey for audit from 198.51.100.4 port 1022 ssh2'");

        let out = run_failed_logins(dir.path());

        assert_eq!(out, "Oct 19 03:00:00 web1 sshd[900]: Failed publickey for audit from 198.51.100.4 port 1022 ssh2");
    }

    #[test]
    fn no_sources_yield_empty_output() {
        let dir = fixture("exit 1");
        std::fs::remove_file(dir.path().join("auth.log")).unwrap();

        assert_eq!(run_failed_logins(dir.path()), "");
    }
}
