use serde::{Deserialize, Serialize};

/// Values derived from an audit report by best-effort text extraction.
///
/// Every field defaults to its zero value; a missing pattern never turns
/// into an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Signals {
    /// One-minute load average, when the load section could be parsed
    pub load_average: Option<f64>,

    pub failed_login_count: usize,

    pub failed_service_count: usize,

    /// Unit names of failed services; may be shorter than the count
    pub failed_service_names: Vec<String>,

    pub pending_security_updates: usize,

    /// Short summary of security-relevant listening ports, e.g. "22 (SSH), 80 (HTTP)"
    pub listening_ports: String,
}
