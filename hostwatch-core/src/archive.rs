use crate::error::Result;
use crate::types::{AuditReport, ProbeResult, ReportMetadata};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Directory holding one audit report and one analysis document per run,
/// named by host and generation time. Nothing is ever rotated.
#[derive(Debug, Clone)]
pub struct ArtifactArchive {
    dir: PathBuf,
}

impl ArtifactArchive {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<host>_<YYYYmmdd_HHMMSS>`, with unsafe filename characters replaced
    pub fn file_stem(metadata: &ReportMetadata) -> String {
        let host: String = metadata
            .host
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '.' { c } else { '_' })
            .collect();
        format!("{}_{}", host, metadata.generated_at.format("%Y%m%d_%H%M%S"))
    }

    pub fn report_path(&self, metadata: &ReportMetadata) -> PathBuf {
        self.dir.join(format!("{}.log", Self::file_stem(metadata)))
    }

    /// Create the report file and write its header; sections are appended
    /// as probes finish, so an interrupted run leaves a partial report
    pub fn begin_report(&self, metadata: &ReportMetadata) -> Result<ReportJournal> {
        fs::create_dir_all(&self.dir)?;
        let path = self.report_path(metadata);
        let mut file = File::create(&path)?;
        file.write_all(metadata.render_header().as_bytes())?;
        tracing::debug!(path = %path.display(), "report started");
        Ok(ReportJournal { path, file })
    }

    /// Write a complete report in one go
    pub fn store_report(&self, report: &AuditReport) -> Result<PathBuf> {
        let path = self.report_path(&report.metadata);
        self.write(&path, &report.render())?;
        Ok(path)
    }

    pub fn store_analysis(&self, report: &AuditReport, analysis: &str) -> Result<PathBuf> {
        let path = self
            .dir
            .join(format!("{}_analysis.txt", Self::file_stem(&report.metadata)));
        self.write(&path, analysis)?;
        Ok(path)
    }

    fn write(&self, path: &Path, content: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(path, content)?;
        tracing::debug!(path = %path.display(), bytes = content.len(), "artifact written");
        Ok(())
    }
}

/// An open report file receiving sections in execution order
#[derive(Debug)]
pub struct ReportJournal {
    path: PathBuf,
    file: File,
}

impl ReportJournal {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&mut self, section: &ProbeResult) -> Result<()> {
        self.file.write_all(section.render().as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn report(host: &str) -> AuditReport {
        AuditReport {
            metadata: ReportMetadata {
                host: host.to_string(),
                address: "192.0.2.10".to_string(),
                port: 22,
                generated_at: Utc.with_ymd_and_hms(2026, 10, 19, 3, 30, 5).unwrap(),
                transport: "local".to_string(),
                version: "test".to_string(),
            },
            sections: vec![
                ProbeResult::succeeded("Load Average", "load average: 0.10, 0.20, 0.30"),
                ProbeResult::failed("Firewall Rules", "permission denied"),
            ],
        }
    }

    #[test]
    fn names_by_host_and_timestamp() {
        assert_eq!(ArtifactArchive::file_stem(&report("web1").metadata), "web1_20261019_033005");
        assert_eq!(
            ArtifactArchive::file_stem(&report("../etc/x y").metadata),
            ".._etc_x_y_20261019_033005"
        );
    }

    #[test]
    fn stores_both_artifacts_in_nested_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = ArtifactArchive::new(tmp.path().join("reports"));
        let report = report("web1");

        let report_path = archive.store_report(&report).unwrap();
        let analysis_path = archive.store_analysis(&report, "Risk level: LOW\n").unwrap();

        assert_eq!(report_path.file_name().unwrap(), "web1_20261019_033005.log");
        assert_eq!(analysis_path.file_name().unwrap(), "web1_20261019_033005_analysis.txt");

        let stored = fs::read_to_string(&report_path).unwrap();
        assert_eq!(AuditReport::parse(&stored).unwrap(), report);
        assert_eq!(fs::read_to_string(&analysis_path).unwrap(), "Risk level: LOW\n");
    }

    #[test]
    fn journal_matches_rendered_report() {
        let tmp = tempfile::tempdir().unwrap();
        let archive = ArtifactArchive::new(tmp.path());
        let report = report("db1");

        let mut journal = archive.begin_report(&report.metadata).unwrap();
        journal.append(&report.sections[0]).unwrap();

        let partial = AuditReport::parse(&fs::read_to_string(journal.path()).unwrap()).unwrap();
        assert_eq!(partial.sections.len(), 1);

        journal.append(&report.sections[1]).unwrap();
        assert_eq!(fs::read_to_string(journal.path()).unwrap(), report.render());
    }
}
