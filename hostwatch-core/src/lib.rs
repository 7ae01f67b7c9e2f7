pub mod analysis;
pub mod archive;
pub mod builder;
pub mod config;
pub mod delivery;
pub mod error;
pub mod extract;
pub mod probes;
pub mod risk;
pub mod schedule;
pub mod transport;
pub mod types;

use archive::ArtifactArchive;
use builder::AuditLogBuilder;
use chrono::Utc;
use config::{AppConfig, HostRegistry};
use delivery::ReportSink;
use error::{AuditError, Result};
use extract::SignalExtractor;
use probes::ProbeBattery;
use risk::RiskClassifier;
use serde::Serialize;
use std::path::PathBuf;
use transport::{LocalIdentity, Route, SshConnector, Transport, TransportSelector};
use types::*;

/// Result of auditing one host
#[derive(Debug, Clone, Serialize)]
pub struct AuditOutcome {
    pub host: String,
    pub route: Route,
    pub transport: String,
    pub report_path: PathBuf,
    pub analysis_path: Option<PathBuf>,
    pub probes: usize,
    pub failed_probes: usize,
    pub signals: Option<Signals>,
    pub assessment: Option<RiskAssessment>,
    pub delivered: bool,
    pub delivery_error: Option<String>,
}

impl AuditOutcome {
    pub fn tier(&self) -> Option<RiskTier> {
        self.assessment.as_ref().map(|a| a.tier)
    }
}

/// A host that could not be audited in a batch run
#[derive(Debug, Clone, Serialize)]
pub struct HostFailure {
    pub host: String,
    pub error: String,
}

/// Outcome of auditing every enabled host
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub completed: Vec<AuditOutcome>,
    pub failed: Vec<HostFailure>,
}

impl BatchSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Main orchestrator: transport selection, probing, archiving, analysis and
/// delivery for one host or the whole registry
pub struct AuditRunner {
    registry: HostRegistry,
    selector: TransportSelector,
    battery: ProbeBattery,
    extractor: SignalExtractor,
    classifier: RiskClassifier,
    archive: ArtifactArchive,
    sink: Box<dyn ReportSink>,
    analysis: bool,
    deliver: bool,
}

impl AuditRunner {
    /// Build a runner from loaded configuration, detecting the local identity
    pub fn new(config: &AppConfig, sink: Box<dyn ReportSink>) -> Result<Self> {
        let selector = TransportSelector::new(
            LocalIdentity::detect(),
            Box::new(SshConnector::new(config.ssh.connect_timeout())),
        );

        Ok(Self {
            registry: config.registry(),
            selector,
            battery: ProbeBattery::standard(),
            extractor: SignalExtractor::from_config(&config.analysis)?,
            classifier: RiskClassifier::new(config.analysis.thresholds),
            archive: ArtifactArchive::new(&config.general.report_dir),
            sink,
            analysis: config.general.analysis,
            deliver: config.general.deliver,
        })
    }

    pub fn with_selector(mut self, selector: TransportSelector) -> Self {
        self.selector = selector;
        self
    }

    pub fn with_battery(mut self, battery: ProbeBattery) -> Self {
        self.battery = battery;
        self
    }

    pub fn with_delivery(mut self, deliver: bool) -> Self {
        self.deliver = deliver;
        self
    }

    /// Audit a host by its registry name
    pub fn audit_host(&self, name: &str) -> Result<AuditOutcome> {
        let profile = self.registry.get(name)?;
        if !profile.enabled {
            tracing::info!(host = %name, "host is disabled, auditing on explicit request");
        }
        self.audit_profile(profile)
    }

    /// Select a transport for the profile and audit through it
    pub fn audit_profile(&self, profile: &HostProfile) -> Result<AuditOutcome> {
        let (route, transport) = self.selector.select(profile);
        self.audit_with(profile, route, transport.as_ref())
    }

    /// Run the battery through an already chosen transport
    pub fn audit_with(&self, profile: &HostProfile, route: Route, transport: &dyn Transport) -> Result<AuditOutcome> {
        tracing::info!(host = %profile.name, ?route, "audit started");

        let builder = AuditLogBuilder::new(profile, Utc::now()).with_transport(transport.describe());
        let journal = self.archive.begin_report(builder.metadata())?;
        let report_path = journal.path().to_path_buf();
        let mut builder = builder.with_journal(journal);

        self.battery.run(transport, &mut builder);

        let intact = builder.journal_intact();
        let report = builder.build();
        if !intact {
            self.archive.store_report(&report)?;
        }

        let (signals, assessment, analysis_path, body) = if self.analysis {
            let (signals, assessment) = self.analyze_report(&report);
            let analysis = analysis::render_analysis(&report, &signals, &assessment);
            let path = self.archive.store_analysis(&report, &analysis)?;
            let body = format!("{}\n{}", analysis, report.render());
            (Some(signals), Some(assessment), Some(path), body)
        } else {
            (None, None, None, report.render())
        };

        let mut outcome = AuditOutcome {
            host: profile.name.clone(),
            route,
            transport: report.metadata.transport.clone(),
            report_path,
            analysis_path,
            probes: report.sections.len(),
            failed_probes: report.failed_sections(),
            signals,
            assessment,
            delivered: false,
            delivery_error: None,
        };

        if self.deliver {
            let subject = match outcome.tier() {
                Some(tier) => format!("[hostwatch] {} security audit: {}", profile.name, tier),
                None => format!("[hostwatch] {} security audit", profile.name),
            };
            match self.sink.deliver(&profile.contact, &subject, &body) {
                Ok(()) => outcome.delivered = true,
                Err(e) => {
                    tracing::warn!(host = %profile.name, sink = self.sink.name(), error = %e, "report not delivered, artifacts kept");
                    outcome.delivery_error = Some(e.to_string());
                }
            }
        }

        tracing::info!(
            host = %profile.name,
            probes = outcome.probes,
            failed = outcome.failed_probes,
            tier = ?outcome.tier(),
            delivered = outcome.delivered,
            "audit finished"
        );
        Ok(outcome)
    }

    /// Audit every enabled host, skipping hosts that fail.
    ///
    /// Enabled entries rejected by the registry are reported as failures
    /// without being contacted.
    pub fn audit_all(&self) -> BatchSummary {
        let mut summary = BatchSummary::default();

        for rejected in self.registry.rejected().filter(|r| r.enabled) {
            tracing::error!(host = %rejected.name, error = %rejected.error, "host entry invalid, skipping");
            summary.failed.push(HostFailure {
                host: rejected.name.clone(),
                error: AuditError::config(rejected.error.clone()).to_string(),
            });
        }

        for profile in self.registry.list_enabled() {
            match self.audit_profile(profile) {
                Ok(outcome) => summary.completed.push(outcome),
                Err(e) => {
                    tracing::error!(host = %profile.name, error = %e, "audit failed, continuing with next host");
                    summary.failed.push(HostFailure {
                        host: profile.name.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        summary
    }

    /// Extract signals from a report and classify them
    pub fn analyze_report(&self, report: &AuditReport) -> (Signals, RiskAssessment) {
        let signals = self.extractor.extract(report);
        let assessment = self.classifier.classify(&signals);
        (signals, assessment)
    }
}
