use crate::types::{AuditReport, RiskAssessment, Signals};

const RULE: &str = "─────────────────────────────────────────────────────────────";

/// Render the analysis document stored next to an audit report and used
/// as the mail body.
pub fn render_analysis(report: &AuditReport, signals: &Signals, assessment: &RiskAssessment) -> String {
    let meta = &report.metadata;
    let mut out = String::new();

    out.push_str(&format!("Security analysis for {} ({}:{})\n", meta.host, meta.address, meta.port));
    out.push_str(&format!("Generated: {}\n\n", meta.generated_at.format("%Y-%m-%d %H:%M:%S UTC")));

    out.push_str(&format!("{}\nRISK ASSESSMENT\n{}\n", RULE, RULE));
    out.push_str(&format!("Risk level: {}\n", assessment.tier));
    out.push_str(&format!("Risk score: {}\n\n", assessment.score));

    out.push_str(&format!("{}\nSIGNALS\n{}\n", RULE, RULE));
    match signals.load_average {
        Some(load) => out.push_str(&format!("Load average (1m): {:.2}\n", load)),
        None => out.push_str("Load average (1m): unknown\n"),
    }
    out.push_str(&format!("Failed logins: {}\n", signals.failed_login_count));
    out.push_str(&format!("Failed services: {}", signals.failed_service_count));
    if !signals.failed_service_names.is_empty() {
        out.push_str(&format!(" ({})", signals.failed_service_names.join(", ")));
    }
    out.push('\n');
    out.push_str(&format!("Pending security updates: {}\n", signals.pending_security_updates));
    if signals.listening_ports.is_empty() {
        out.push_str("Listening ports: none detected\n");
    } else {
        out.push_str(&format!("Listening ports: {}\n", signals.listening_ports));
    }

    let failed = report.failed_sections();
    if failed > 0 {
        out.push_str(&format!("Probes failed: {} of {}\n", failed, report.sections.len()));
    }
    out.push('\n');

    out.push_str(&format!("{}\nRECOMMENDATIONS\n{}\n", RULE, RULE));
    for line in assessment.numbered() {
        out.push_str(&line);
        out.push('\n');
    }

    out
}
