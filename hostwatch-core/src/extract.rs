use crate::config::AnalysisConfig;
use crate::error::{AuditError, Result};
use crate::probes::labels;
use crate::probes::network::{identify_service, parse_local_port};
use crate::types::{AuditReport, Signals};
use regex::Regex;

/// Lines excluded from the failed-login count by default: sudo's own log
/// entries echo the probe's grep pattern back into the auth log
pub const DEFAULT_FAILED_LOGIN_EXCLUDE: &str = r"sudo:|COMMAND=";

/// Ports worth reporting in the listening summary
pub const SECURITY_RELEVANT_PORTS: &[u16] = &[
    21, 22, 23, 25, 53, 80, 110, 143, 443, 445, 993, 995, 3306, 3389, 5432, 5900, 6379, 8080, 8443, 27017,
];

pub const DEFAULT_MAX_PORTS: usize = 10;

const AUTH_FAILURE_PATTERN: &str =
    r"(?i)(failed password|failed publickey|authentication failure|invalid user|failed login)";
const LOAD_PATTERN: &str = r"(?i)load averages?:?\s*([0-9]+(?:[.,][0-9]+)?)";

const UNIT_SUFFIXES: &[&str] = &[
    ".service", ".socket", ".timer", ".mount", ".automount", ".path", ".target", ".swap", ".device", ".scope",
    ".slice",
];

/// Derives signals from an audit report.
///
/// Extraction is total: a missing, empty or failed section yields the zero
/// value of its signal.
#[derive(Debug, Clone)]
pub struct SignalExtractor {
    auth_failure: Regex,
    exclude: Option<Regex>,
    load: Regex,
    max_ports: usize,
}

impl SignalExtractor {
    /// Build an extractor; an empty exclusion pattern disables exclusion
    pub fn new(failed_login_exclude: &str, max_ports: usize) -> Result<Self> {
        let exclude = if failed_login_exclude.trim().is_empty() {
            None
        } else {
            Some(Regex::new(failed_login_exclude).map_err(|e| {
                AuditError::config(format!(
                    "invalid failed-login exclusion pattern '{}': {}",
                    failed_login_exclude, e
                ))
            })?)
        };

        Ok(Self {
            auth_failure: Regex::new(AUTH_FAILURE_PATTERN)
                .map_err(|e| AuditError::config(format!("invalid auth failure pattern: {}", e)))?,
            exclude,
            load: Regex::new(LOAD_PATTERN).map_err(|e| AuditError::config(format!("invalid load pattern: {}", e)))?,
            max_ports,
        })
    }

    pub fn from_config(config: &AnalysisConfig) -> Result<Self> {
        Self::new(&config.failed_login_exclude, config.max_ports)
    }

    pub fn extract(&self, report: &AuditReport) -> Signals {
        let section = |label: &str| report.output_of(label).unwrap_or("");

        let (failed_service_count, failed_service_names) = failed_services(section(labels::FAILED_SERVICES));

        Signals {
            load_average: self.load_average(section(labels::LOAD)),
            failed_login_count: self.failed_logins(section(labels::FAILED_LOGINS)),
            failed_service_count,
            failed_service_names,
            pending_security_updates: security_updates(section(labels::SECURITY_UPDATES)),
            listening_ports: self.listening_ports(section(labels::LISTENING)),
        }
    }

    /// First number after "load average"
    pub fn load_average(&self, text: &str) -> Option<f64> {
        self.load
            .captures(text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().replace(',', ".").parse::<f64>().ok())
            .filter(|v| v.is_finite())
    }

    /// Authentication failure lines, minus excluded noise
    pub fn failed_logins(&self, text: &str) -> usize {
        text.lines()
            .filter(|line| self.auth_failure.is_match(line))
            .filter(|line| !self.exclude.as_ref().is_some_and(|re| re.is_match(line)))
            .count()
    }

    /// Security-relevant listening ports, first-seen order, de-duplicated
    pub fn listening_ports(&self, text: &str) -> String {
        let mut ports: Vec<u16> = Vec::new();

        for port in text.lines().filter_map(parse_local_port) {
            if SECURITY_RELEVANT_PORTS.contains(&port) && !ports.contains(&port) {
                ports.push(port);
            }
        }

        ports
            .iter()
            .take(self.max_ports)
            .map(|port| match identify_service(*port) {
                Some(name) => format!("{} ({})", port, name),
                None => port.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Count of lines in a failed state, with the unit names that could be read
pub fn failed_services(text: &str) -> (usize, Vec<String>) {
    let mut count = 0;
    let mut names = Vec::new();

    for line in text.lines() {
        if !line.to_ascii_lowercase().contains("failed") {
            continue;
        }
        count += 1;

        let unit = line
            .split_whitespace()
            .map(|token| token.trim_start_matches(['●', '*', '×']))
            .find(|token| UNIT_SUFFIXES.iter().any(|suffix| token.len() > suffix.len() && token.ends_with(suffix)));

        if let Some(unit) = unit {
            if !names.iter().any(|n| n == unit) {
                names.push(unit.to_string());
            }
        }
    }

    (count, names)
}

/// Pending updates flagged as security fixes
pub fn security_updates(text: &str) -> usize {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("Listing"))
        .filter(|line| line.to_ascii_lowercase().contains("security") || line.contains("/Sec."))
        .count()
}
