use crate::error::{AuditError, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Prefix of the placeholder written in place of a failed probe's output
pub const FAILURE_PREFIX: &str = "[probe failed";

const RULE: &str = "======================================================================";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Output of one probe, captured as one labeled report section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub label: String,

    /// Raw command output, or a failure placeholder
    pub output: String,

    /// Whether the command itself completed, regardless of what it found
    pub success: bool,
}

impl ProbeResult {
    pub fn succeeded(label: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            output: output.into().trim_end().to_string(),
            success: true,
        }
    }

    /// Failed probes keep their section, with an explanatory line as output
    pub fn failed(label: impl Into<String>, reason: &str) -> Self {
        let reason = reason.trim();
        let reason = if reason.is_empty() { "no output" } else { reason };
        Self {
            label: label.into(),
            output: format!("{}: {}]", FAILURE_PREFIX, reason.replace('\n', " | ")),
            success: false,
        }
    }

    /// `=== label ===` followed by the output and a blank line.
    ///
    /// Output lines that would read back as a section header, or a leading
    /// line that would read back as a failure placeholder, get one extra
    /// `\` in front.
    pub fn render(&self) -> String {
        let mut out = format!("=== {} ===\n", self.label);
        if !self.output.is_empty() {
            for (i, line) in self.output.split('\n').enumerate() {
                if needs_escape(line, self.success && i == 0) {
                    out.push('\\');
                }
                out.push_str(line);
                out.push('\n');
            }
        }
        out.push('\n');
        out
    }
}

/// Where and when a report was generated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportMetadata {
    pub host: String,
    pub address: String,
    pub port: u16,
    pub generated_at: DateTime<Utc>,

    /// "local" or the remote principal@address the probes ran through
    pub transport: String,

    pub version: String,
}

impl ReportMetadata {
    /// Banner and header lines written before the first section
    pub fn render_header(&self) -> String {
        let mut out = String::new();

        out.push_str(RULE);
        out.push_str("\n hostwatch security audit\n");
        out.push_str(RULE);
        out.push('\n');
        out.push_str(&format!("Host: {}\n", self.host));
        out.push_str(&format!("Address: {}:{}\n", self.address, self.port));
        out.push_str(&format!("Transport: {}\n", self.transport));
        out.push_str(&format!("Generated: {}\n", self.generated_at.format(TIMESTAMP_FORMAT)));
        out.push_str(&format!("Version: {}\n", self.version));
        out.push_str(RULE);
        out.push_str("\n\n");
        out
    }
}

/// Ordered, labeled sections of one host audit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReport {
    pub metadata: ReportMetadata,
    pub sections: Vec<ProbeResult>,
}

impl AuditReport {
    /// Find a section by label
    pub fn section(&self, label: &str) -> Option<&ProbeResult> {
        self.sections.iter().find(|s| s.label == label)
    }

    /// Output of a section whose probe succeeded
    pub fn output_of(&self, label: &str) -> Option<&str> {
        self.section(label)
            .filter(|s| s.success)
            .map(|s| s.output.as_str())
    }

    pub fn failed_sections(&self) -> usize {
        self.sections.iter().filter(|s| !s.success).count()
    }

    /// Render the report as the text artifact that gets archived and mailed
    pub fn render(&self) -> String {
        let mut out = self.metadata.render_header();
        for section in &self.sections {
            out.push_str(&section.render());
        }
        out
    }

    /// Parse a previously rendered report back into sections
    pub fn parse(text: &str) -> Result<Self> {
        let mut host = None;
        let mut address = None;
        let mut port = 22;
        let mut generated_at = None;
        let mut transport = String::from("unknown");
        let mut version = String::from("unknown");

        let mut sections: Vec<ProbeResult> = Vec::new();
        let mut current: Option<(String, Vec<&str>)> = None;

        for line in text.lines() {
            if let Some(label) = section_label(line) {
                if let Some((label, lines)) = current.take() {
                    sections.push(finish_section(label, &lines));
                }
                current = Some((label.to_string(), Vec::new()));
                continue;
            }

            if let Some((_, ref mut lines)) = current {
                lines.push(line);
                continue;
            }

            // Header
            if let Some(value) = line.strip_prefix("Host: ") {
                host = Some(value.trim().to_string());
            } else if let Some(value) = line.strip_prefix("Address: ") {
                let value = value.trim();
                match value.rsplit_once(':') {
                    Some((addr, p)) if p.parse::<u16>().is_ok() => {
                        address = Some(addr.to_string());
                        port = p.parse().unwrap_or(22);
                    }
                    _ => address = Some(value.to_string()),
                }
            } else if let Some(value) = line.strip_prefix("Generated: ") {
                generated_at = NaiveDateTime::parse_from_str(value.trim(), TIMESTAMP_FORMAT)
                    .ok()
                    .map(|t| t.and_utc());
            } else if let Some(value) = line.strip_prefix("Transport: ") {
                transport = value.trim().to_string();
            } else if let Some(value) = line.strip_prefix("Version: ") {
                version = value.trim().to_string();
            }
        }

        if let Some((label, lines)) = current.take() {
            sections.push(finish_section(label, &lines));
        }

        let host = host.ok_or_else(|| AuditError::MalformedReport("missing Host header".into()))?;
        let generated_at = generated_at
            .ok_or_else(|| AuditError::MalformedReport("missing or invalid Generated header".into()))?;

        Ok(Self {
            metadata: ReportMetadata {
                address: address.unwrap_or_else(|| host.clone()),
                host,
                port,
                generated_at,
                transport,
                version,
            },
            sections,
        })
    }
}

fn section_label(line: &str) -> Option<&str> {
    line.strip_prefix("=== ")
        .and_then(|rest| rest.strip_suffix(" ==="))
        .map(str::trim)
        .filter(|label| !label.is_empty())
}

/// Whether `line`, once any leading backslashes are dropped, reads as
/// report structure rather than output
fn needs_escape(line: &str, leading: bool) -> bool {
    let bare = line.trim_start_matches('\\');
    section_label(bare).is_some() || (leading && bare.starts_with(FAILURE_PREFIX))
}

fn unescape(line: &str, leading: bool) -> &str {
    match line.strip_prefix('\\') {
        Some(rest) if needs_escape(rest, leading) => rest,
        _ => line,
    }
}

fn finish_section(label: String, lines: &[&str]) -> ProbeResult {
    let success = !lines.first().is_some_and(|first| first.starts_with(FAILURE_PREFIX));
    let output = lines
        .iter()
        .enumerate()
        .map(|(i, line)| unescape(line, success && i == 0))
        .collect::<Vec<_>>()
        .join("\n")
        .trim_end()
        .to_string();
    ProbeResult { label, output, success }
}
