use super::{ScheduleTrigger, TriggerStore};
use crate::error::{AuditError, Result};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

/// Trigger store backed by the invoking user's crontab.
///
/// Each entry ends with a `# <tag>:<host>` marker; lines without a marker
/// for the tag are preserved byte for byte.
#[derive(Debug, Clone)]
pub struct CrontabStore {
    /// Command prefix the entries run, e.g. `/usr/local/bin/hostwatch --config /etc/hostwatch.toml`
    program: String,
    crontab_bin: String,
}

impl CrontabStore {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            crontab_bin: "crontab".to_string(),
        }
    }

    pub fn with_crontab_bin(mut self, bin: impl Into<String>) -> Self {
        self.crontab_bin = bin.into();
        self
    }

    /// Current crontab text; no crontab at all reads as empty
    fn read(&self) -> Result<String> {
        let output = Command::new(&self.crontab_bin)
            .arg("-l")
            .output()
            .map_err(|e| AuditError::Store(format!("failed to run {} -l: {}", self.crontab_bin, e)))?;

        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.contains("no crontab") {
            Ok(String::new())
        } else {
            Err(AuditError::Store(format!("{} -l failed: {}", self.crontab_bin, stderr.trim())))
        }
    }

    fn write(&self, content: &str) -> Result<()> {
        let mut child = Command::new(&self.crontab_bin)
            .arg("-")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| AuditError::Store(format!("failed to run {} -: {}", self.crontab_bin, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(content.as_bytes())?;
        }

        let output = child.wait_with_output()?;
        if output.status.success() {
            Ok(())
        } else {
            Err(AuditError::Store(format!(
                "{} rejected the new table: {}",
                self.crontab_bin,
                String::from_utf8_lossy(&output.stderr).trim()
            )))
        }
    }
}

impl TriggerStore for CrontabStore {
    fn list_tagged(&self, tag: &str) -> Result<Vec<ScheduleTrigger>> {
        Ok(parse_tagged(&self.read()?, tag))
    }

    fn replace(&self, tag: &str, triggers: &[ScheduleTrigger]) -> Result<()> {
        let current = self.read()?;
        self.write(&rewrite(&current, tag, triggers, &self.program))
    }
}

fn marker_host<'a>(line: &'a str, tag: &str) -> Option<(&'a str, &'a str)> {
    let (entry, marker) = line.rsplit_once(" # ")?;
    let host = marker.trim().strip_prefix(tag)?.strip_prefix(':')?;
    if host.is_empty() {
        None
    } else {
        Some((entry, host))
    }
}

/// Triggers carrying the tag's marker
pub fn parse_tagged(content: &str, tag: &str) -> Vec<ScheduleTrigger> {
    content
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .filter_map(|line| {
            let (entry, host) = marker_host(line, tag)?;
            let fields: Vec<&str> = entry.split_whitespace().take(5).collect();
            ScheduleTrigger::from_cron_fields(&fields, host)
        })
        .collect()
}

/// Quote one word for the shell cron hands the line to.
///
/// Words made only of safe characters pass through unchanged; `%` is
/// escaped in every case since cron turns a bare `%` into a newline.
pub fn cron_arg(word: &str) -> String {
    let safe = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '/' | ':' | '=' | '+' | ','));
    let quoted = if safe {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', "'\\''"))
    };
    quoted.replace('%', "\\%")
}

/// Command prefix for entries: the binary pointed at a config file
pub fn program_command(exe: &Path, config: &Path) -> String {
    format!(
        "{} --config {}",
        cron_arg(&exe.to_string_lossy()),
        cron_arg(&config.to_string_lossy())
    )
}

/// Render one crontab line for a trigger
pub fn render_entry(trigger: &ScheduleTrigger, tag: &str, program: &str) -> String {
    format!(
        "{} {} audit {} >/dev/null 2>&1 # {}:{}",
        trigger.cron_fields(),
        program,
        cron_arg(&trigger.host),
        tag,
        trigger.host
    )
}

/// Drop every line tagged for this tool and append the given triggers
pub fn rewrite(content: &str, tag: &str, triggers: &[ScheduleTrigger], program: &str) -> String {
    let mut lines: Vec<String> = content
        .lines()
        .filter(|line| line.trim_start().starts_with('#') || marker_host(line, tag).is_none())
        .map(String::from)
        .collect();

    lines.extend(triggers.iter().map(|t| render_entry(t, tag, program)));

    let mut out = lines.join("\n");
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROGRAM: &str = "/usr/local/bin/hostwatch --config /etc/hostwatch/hostwatch.toml";

    fn trigger(host: &str, minute: u8, hour: u8, dow: Option<u8>) -> ScheduleTrigger {
        ScheduleTrigger {
            minute,
            hour,
            day_of_month: None,
            day_of_week: dow,
            host: host.to_string(),
        }
    }

    const EXISTING: &str = "\
# m h dom mon dow command
MAILTO=ops@example.com
0 1 * * * /usr/local/bin/backup.sh
0 2 * * * /usr/local/bin/hostwatch --config /etc/hostwatch/hostwatch.toml audit web1 >/dev/null 2>&1 # hostwatch:web1
15 4 1 * * /opt/report.sh # nightly report
";

    #[test]
    fn parses_only_tagged_entries() {
        let triggers = parse_tagged(EXISTING, "hostwatch");
        assert_eq!(triggers, vec![trigger("web1", 0, 2, None)]);
        assert!(parse_tagged(EXISTING, "backup").is_empty());
    }

    #[test]
    fn rewrite_preserves_unrelated_lines() {
        let updated = rewrite(
            EXISTING,
            "hostwatch",
            &[trigger("web1", 30, 3, Some(1)), trigger("db1", 0, 4, None)],
            PROGRAM,
        );

        assert!(updated.starts_with("# m h dom mon dow command\nMAILTO=ops@example.com\n"));
        assert!(updated.contains("0 1 * * * /usr/local/bin/backup.sh\n"));
        assert!(updated.contains("15 4 1 * * /opt/report.sh # nightly report\n"));
        assert!(!updated.contains("0 2 * * *"));
        assert!(updated.ends_with(&format!("0 4 * * * {} audit db1 >/dev/null 2>&1 # hostwatch:db1\n", PROGRAM)));

        let triggers = parse_tagged(&updated, "hostwatch");
        assert_eq!(triggers.len(), 2);
        assert_eq!(triggers[0].cron_fields(), "30 3 * * 1");
    }

    #[test]
    fn rewrite_with_no_triggers_removes_all_tagged() {
        let updated = rewrite(EXISTING, "hostwatch", &[], PROGRAM);
        assert!(parse_tagged(&updated, "hostwatch").is_empty());
        assert_eq!(updated.lines().count(), 4);
    }

    #[test]
    fn program_paths_are_quoted_for_cron() {
        let program = program_command(
            Path::new("/opt/host watch/bin/hostwatch"),
            Path::new("/etc/it's 100%.toml"),
        );
        assert_eq!(
            program,
            r"'/opt/host watch/bin/hostwatch' --config '/etc/it'\''s 100\%.toml'"
        );

        let plain = program_command(Path::new("/usr/local/bin/hostwatch"), Path::new("/etc/hostwatch/hostwatch.toml"));
        assert_eq!(plain, PROGRAM);
    }

    #[test]
    fn quoted_program_survives_the_shell() {
        let dir = tempfile::tempdir().unwrap();
        let odd = dir.path().join("odd dir; $(touch pwned)");
        std::fs::create_dir(&odd).unwrap();
        let script = odd.join("echo args.sh");
        std::fs::write(&script, "#!/bin/sh\nprintf '%s|' \"$@\"\n").unwrap();
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        let program = program_command(&script, &odd.join("cfg.toml"));
        let output = Command::new("sh")
            .arg("-c")
            .arg(format!("cd {} && {} audit web1", cron_arg(&dir.path().to_string_lossy()), program))
            .output()
            .unwrap();

        assert!(output.status.success());
        assert_eq!(
            String::from_utf8_lossy(&output.stdout),
            format!("--config|{}|audit|web1|", odd.join("cfg.toml").display())
        );
        assert!(!dir.path().join("pwned").exists());
    }

    #[test]
    fn rewrite_of_empty_table() {
        assert_eq!(rewrite("", "hostwatch", &[], PROGRAM), "");
        let updated = rewrite("", "hostwatch", &[trigger("web1", 5, 6, None)], PROGRAM);
        assert_eq!(updated.lines().count(), 1);
    }
}
