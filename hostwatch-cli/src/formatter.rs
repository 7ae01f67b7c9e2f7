use anyhow::Result;
use colored::{ColoredString, Colorize};
use hostwatch_core::config::HostRegistry;
use hostwatch_core::schedule::ScheduleTrigger;
use hostwatch_core::types::{RiskAssessment, RiskTier, Signals};
use hostwatch_core::{AuditOutcome, BatchSummary};
use serde::Serialize;

const HEAVY: &str = "═══════════════════════════════════════════════════════════════";
const LIGHT: &str = "─────────────────────────────────────────────────────────────";

fn tier_label(tier: RiskTier) -> ColoredString {
    match tier {
        RiskTier::High => tier.as_str().red().bold(),
        RiskTier::Medium => tier.as_str().yellow().bold(),
        RiskTier::Low => tier.as_str().green(),
    }
}

/// One audited host as a few human-readable lines
pub fn format_outcome(outcome: &AuditOutcome) -> String {
    let mut output = String::new();

    output.push_str(&format!("{} {}\n", "Host:".bold(), outcome.host));
    output.push_str(&format!("  Transport:  {}\n", outcome.transport));
    output.push_str(&format!("  Probes:     {}", outcome.probes));
    if outcome.failed_probes > 0 {
        output.push_str(&format!(" ({})", format!("{} failed", outcome.failed_probes).yellow()));
    }
    output.push('\n');

    if let Some(ref assessment) = outcome.assessment {
        output.push_str(&format!(
            "  Risk:       {} (score {})\n",
            tier_label(assessment.tier),
            assessment.score
        ));
    }

    output.push_str(&format!("  Report:     {}\n", outcome.report_path.display()));
    if let Some(ref path) = outcome.analysis_path {
        output.push_str(&format!("  Analysis:   {}\n", path.display()));
    }

    let delivery = if outcome.delivered {
        "sent".green()
    } else if let Some(ref error) = outcome.delivery_error {
        format!("failed: {}", error).red()
    } else {
        "skipped".dimmed()
    };
    output.push_str(&format!("  Email:      {}\n", delivery));

    output
}

/// Outcome of an audit-all run
pub fn format_summary(summary: &BatchSummary) -> String {
    let mut output = String::new();

    output.push_str(HEAVY);
    output.push_str("\n        hostwatch fleet audit\n");
    output.push_str(HEAVY);
    output.push_str("\n\n");

    for outcome in &summary.completed {
        output.push_str(&format_outcome(outcome));
        output.push('\n');
    }

    if !summary.failed.is_empty() {
        output.push_str(LIGHT);
        output.push_str(&format!("\n{}\n", "FAILED HOSTS".red().bold()));
        output.push_str(LIGHT);
        output.push('\n');
        for failure in &summary.failed {
            output.push_str(&format!("  {}: {}\n", failure.host, failure.error));
        }
        output.push('\n');
    }

    output.push_str(&format!(
        "{} audited, {} failed\n",
        summary.completed.len(),
        summary.failed.len()
    ));
    output
}

/// Signals and assessment of an analyzed report file
pub fn format_analysis(host: &str, signals: &Signals, assessment: &RiskAssessment) -> String {
    let mut output = String::new();

    output.push_str(&format!("{} {}\n", "Host:".bold(), host));
    output.push_str(&format!(
        "Risk level: {} (score {})\n\n",
        tier_label(assessment.tier),
        assessment.score
    ));

    if let Some(load) = signals.load_average {
        output.push_str(&format!("  Load average:      {:.2}\n", load));
    }
    output.push_str(&format!("  Failed logins:     {}\n", signals.failed_login_count));
    output.push_str(&format!("  Failed services:   {}\n", signals.failed_service_count));
    output.push_str(&format!("  Security updates:  {}\n", signals.pending_security_updates));
    if !signals.listening_ports.is_empty() {
        output.push_str(&format!("  Listening ports:   {}\n", signals.listening_ports));
    }

    output.push_str("\nRecommendations:\n");
    for line in assessment.numbered() {
        output.push_str(&format!("  {}\n", line));
    }
    output
}

pub fn format_hosts(registry: &HostRegistry) -> String {
    if registry.is_empty() && registry.rejected().next().is_none() {
        return "No hosts configured.\n".to_string();
    }

    let mut output = String::new();
    for host in registry.all() {
        let name = if host.enabled {
            host.name.bold()
        } else {
            format!("{} (disabled)", host.name).dimmed()
        };
        let schedule = host
            .schedule
            .as_ref()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "manual".to_string());

        output.push_str(&format!("{}\n", name));
        output.push_str(&format!("  {}@{}:{}\n", host.principal, host.address, host.port));
        output.push_str(&format!("  contact:  {}\n", host.contact));
        output.push_str(&format!("  schedule: {}\n", schedule));
    }
    for rejected in registry.rejected() {
        output.push_str(&format!("{} {}\n", rejected.name.bold(), "(invalid)".red()));
        output.push_str(&format!("  {}\n", rejected.error));
    }
    output
}

pub fn format_triggers(triggers: &[ScheduleTrigger]) -> String {
    if triggers.is_empty() {
        return "No audit triggers installed.\n".to_string();
    }

    triggers
        .iter()
        .map(|t| format!("{:<20} {}\n", t.cron_fields(), t.host))
        .collect()
}

/// Serialize any result for `--json`
pub fn format_json<T: Serialize>(value: &T, pretty: bool) -> Result<String> {
    if pretty {
        Ok(serde_json::to_string_pretty(value)?)
    } else {
        Ok(serde_json::to_string(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostwatch_core::config::AppConfig;

    #[test]
    fn host_list_shows_invalid_entries() {
        let config = AppConfig::parse(
            "[hosts.web1]\naddress = \"10.0.0.5\"\nprincipal = \"audit\"\n\n[hosts.db1]\naddress = \"10.0.0.6\"\n",
        )
        .unwrap();
        let listing = format_hosts(&config.registry());

        assert!(listing.contains("audit@10.0.0.5:22"));
        assert!(listing.contains("(invalid)"));
        assert!(listing.contains("host 'db1' has no principal"));
    }
}
