use crate::archive::ReportJournal;
use crate::types::{AuditReport, HostProfile, ProbeResult, ReportMetadata};
use chrono::{DateTime, Utc};

/// Accumulates probe results, in execution order, into an audit report.
///
/// With a journal attached every recorded section is also appended to the
/// report file right away.
pub struct AuditLogBuilder {
    metadata: ReportMetadata,
    sections: Vec<ProbeResult>,
    journal: Option<ReportJournal>,
    journal_failed: bool,
}

impl AuditLogBuilder {
    pub fn new(profile: &HostProfile, generated_at: DateTime<Utc>) -> Self {
        Self {
            metadata: ReportMetadata {
                host: profile.name.clone(),
                address: profile.address.clone(),
                port: profile.port,
                generated_at,
                transport: String::from("unknown"),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            sections: Vec::new(),
            journal: None,
            journal_failed: false,
        }
    }

    /// Record which transport the probes ran through
    pub fn with_transport(mut self, transport: impl Into<String>) -> Self {
        self.metadata.transport = transport.into();
        self
    }

    pub fn with_journal(mut self, journal: ReportJournal) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn metadata(&self) -> &ReportMetadata {
        &self.metadata
    }

    pub fn record(&mut self, result: ProbeResult) {
        if let Some(journal) = self.journal.as_mut() {
            if let Err(e) = journal.append(&result) {
                tracing::warn!(path = %journal.path().display(), error = %e, "report journal write failed");
                self.journal = None;
                self.journal_failed = true;
            }
        }
        self.sections.push(result);
    }

    /// False once a journal write failed; the file on disk is incomplete
    pub fn journal_intact(&self) -> bool {
        !self.journal_failed
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn build(self) -> AuditReport {
        AuditReport {
            metadata: self.metadata,
            sections: self.sections,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_execution_order_and_failures() {
        let profile = HostProfile::new("db1", "10.0.0.9", "audit", "ops@example.com").with_port(2200);
        let mut builder = AuditLogBuilder::new(&profile, Utc::now()).with_transport("local");

        builder.record(ProbeResult::succeeded("System Information", "Linux db1 6.1.0"));
        builder.record(ProbeResult::failed("Firewall Rules", "permission denied"));
        builder.record(ProbeResult::succeeded("Load Average", "load average: 0.10, 0.20, 0.30"));
        assert_eq!(builder.len(), 3);

        let report = builder.build();
        let labels: Vec<&str> = report.sections.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["System Information", "Firewall Rules", "Load Average"]);
        assert_eq!(report.metadata.host, "db1");
        assert_eq!(report.metadata.port, 2200);
        assert_eq!(report.metadata.transport, "local");

        let rendered = report.render();
        let header_end = rendered.find("=== System Information ===").unwrap();
        assert!(rendered[..header_end].contains("Host: db1"));
    }

    #[test]
    fn journal_receives_sections_as_recorded() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = crate::archive::ArtifactArchive::new(tmp.path());
        let profile = HostProfile::new("web1", "10.0.0.5", "audit", "ops@example.com");

        let builder = AuditLogBuilder::new(&profile, Utc::now()).with_transport("local");
        let journal = archive.begin_report(builder.metadata()).unwrap();
        let path = journal.path().to_path_buf();
        let mut builder = builder.with_journal(journal);

        builder.record(ProbeResult::succeeded("Load Average", "load average: 0.10"));
        let on_disk = std::fs::read_to_string(&path).unwrap();
        assert!(on_disk.contains("=== Load Average ===\nload average: 0.10\n"));

        builder.record(ProbeResult::failed("Firewall Rules", "denied"));
        assert!(builder.journal_intact());
        let report = builder.build();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), report.render());
    }
}
