use crate::error::{AuditError, Result};
use crate::extract::{SignalExtractor, DEFAULT_FAILED_LOGIN_EXCLUDE, DEFAULT_MAX_PORTS};
use crate::risk::RiskThresholds;
use crate::types::{HostProfile, SchedulePolicy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration loaded from TOML, once per process
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub ssh: SshConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub smtp: SmtpConfig,
    #[serde(default)]
    pub hosts: BTreeMap<String, HostEntry>,
}

/// Process-wide defaults handed to the audit runner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Recipient for hosts without their own contact
    #[serde(default = "default_contact")]
    pub default_contact: String,
    #[serde(default = "default_report_dir")]
    pub report_dir: PathBuf,
    /// Extract signals and classify risk after each audit
    #[serde(default = "default_true")]
    pub analysis: bool,
    /// Mail the report to the host's contact
    #[serde(default = "default_true")]
    pub deliver: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SshConfig {
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Regex; matching lines are not counted as failed logins
    #[serde(default = "default_failed_login_exclude")]
    pub failed_login_exclude: String,
    #[serde(default = "default_max_ports")]
    pub max_ports: usize,
    #[serde(default)]
    pub thresholds: RiskThresholds,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    #[serde(default = "default_smtp_server")]
    pub server: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default = "default_from")]
    pub from: String,
    #[serde(default)]
    pub starttls: bool,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// One `[hosts.<name>]` table as written in the file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostEntry {
    #[serde(default)]
    pub address: String,
    #[serde(default = "default_ssh_port")]
    pub port: u16,
    #[serde(default)]
    pub principal: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub schedule: Option<SchedulePolicy>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Host keys end up in file names and cron command lines
fn is_valid_host_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('-')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

// --- Defaults ---

fn default_contact() -> String {
    "root@localhost".into()
}

fn default_report_dir() -> PathBuf {
    PathBuf::from("/var/log/hostwatch")
}

const fn default_true() -> bool {
    true
}

const fn default_connect_timeout() -> u64 {
    10
}

fn default_failed_login_exclude() -> String {
    DEFAULT_FAILED_LOGIN_EXCLUDE.into()
}

const fn default_max_ports() -> usize {
    DEFAULT_MAX_PORTS
}

fn default_smtp_server() -> String {
    "localhost".into()
}

const fn default_smtp_port() -> u16 {
    25
}

fn default_from() -> String {
    "hostwatch@localhost".into()
}

const fn default_ssh_port() -> u16 {
    22
}

// --- Default impls ---

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_contact: default_contact(),
            report_dir: default_report_dir(),
            analysis: true,
            deliver: true,
        }
    }
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl SshConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            failed_login_exclude: default_failed_login_exclude(),
            max_ports: default_max_ports(),
            thresholds: RiskThresholds::default(),
        }
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            server: default_smtp_server(),
            port: default_smtp_port(),
            from: default_from(),
            starttls: false,
            username: None,
            password: None,
        }
    }
}

impl AppConfig {
    /// Load from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AuditError::config(format!("failed to read {}: {}", path.display(), e)))?;
        Self::parse(&content).map_err(|e| match e {
            AuditError::Configuration(msg) => AuditError::config(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| AuditError::config(format!("invalid TOML: {}", e)))
    }

    /// Resolve the host tables into a registry; invalid entries are kept
    /// aside as rejected hosts instead of failing the whole registry
    pub fn registry(&self) -> HostRegistry {
        HostRegistry::from_config(self)
    }

    /// Check settings that affect every host, such as the failed-login
    /// exclusion pattern.
    ///
    /// Per-host problems are reported by the registry for that host only.
    pub fn validate(&self) -> Result<()> {
        SignalExtractor::from_config(&self.analysis)?;
        Ok(())
    }
}

/// A `[hosts.<name>]` entry that failed validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedHost {
    pub name: String,
    pub error: String,
    pub enabled: bool,
}

/// Host profiles keyed by name, validated once at load time
#[derive(Debug, Clone, Default)]
pub struct HostRegistry {
    hosts: BTreeMap<String, HostProfile>,
    rejected: BTreeMap<String, RejectedHost>,
}

impl HostRegistry {
    pub fn from_config(config: &AppConfig) -> Self {
        let mut registry = Self::default();

        for (name, entry) in &config.hosts {
            match Self::resolve(name, entry, &config.general.default_contact) {
                Ok(profile) => {
                    registry.hosts.insert(name.clone(), profile);
                }
                Err(e) => {
                    tracing::warn!(host = %name, error = %e, "host entry rejected");
                    let error = match e {
                        AuditError::Configuration(msg) => msg,
                        other => other.to_string(),
                    };
                    registry.rejected.insert(
                        name.clone(),
                        RejectedHost {
                            name: name.clone(),
                            error,
                            enabled: entry.enabled,
                        },
                    );
                }
            }
        }

        registry
    }

    fn resolve(name: &str, entry: &HostEntry, default_contact: &str) -> Result<HostProfile> {
        if !is_valid_host_name(name) {
            return Err(AuditError::config(format!(
                "invalid host name '{}': use letters, digits, '.', '_' and '-'",
                name
            )));
        }

        let address = entry.address.trim();
        if address.is_empty() {
            return Err(AuditError::config(format!("host '{}' has no address", name)));
        }
        if address.starts_with('-') || address.chars().any(|c| c.is_whitespace() || c == '@') {
            return Err(AuditError::config(format!("host '{}' has an invalid address '{}'", name, address)));
        }

        let principal = entry
            .principal
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AuditError::config(format!("host '{}' has no principal", name)))?;
        if principal.starts_with('-') || principal.chars().any(|c| c.is_whitespace() || c == '@') {
            return Err(AuditError::config(format!("host '{}' has an invalid principal '{}'", name, principal)));
        }

        if entry.port == 0 {
            return Err(AuditError::config(format!("host '{}' has an invalid port 0", name)));
        }

        let contact = entry
            .contact
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(default_contact);

        Ok(HostProfile {
            name: name.to_string(),
            address: address.to_string(),
            port: entry.port,
            principal: principal.to_string(),
            contact: contact.to_string(),
            schedule: entry.schedule.clone(),
            enabled: entry.enabled,
        })
    }

    /// Build a registry directly from profiles
    pub fn from_profiles(profiles: impl IntoIterator<Item = HostProfile>) -> Self {
        Self {
            hosts: profiles.into_iter().map(|p| (p.name.clone(), p)).collect(),
            rejected: BTreeMap::new(),
        }
    }

    /// A valid profile, the validation error of a rejected entry, or an
    /// unknown-host error
    pub fn get(&self, name: &str) -> Result<&HostProfile> {
        if let Some(profile) = self.hosts.get(name) {
            return Ok(profile);
        }
        match self.rejected.get(name) {
            Some(rejected) => Err(AuditError::config(rejected.error.clone())),
            None => Err(AuditError::config(format!("unknown host '{}'", name))),
        }
    }

    /// Entries that failed validation, ordered by name
    pub fn rejected(&self) -> impl Iterator<Item = &RejectedHost> {
        self.rejected.values()
    }

    /// Enabled hosts, ordered by name
    pub fn list_enabled(&self) -> Vec<&HostProfile> {
        self.hosts.values().filter(|h| h.enabled).collect()
    }

    pub fn all(&self) -> impl Iterator<Item = &HostProfile> {
        self.hosts.values()
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Cadence;
    use std::io::Write;

    const SAMPLE: &str = r#"
[general]
default_contact = "security@example.com"
report_dir = "/tmp/hostwatch-reports"

[ssh]
connect_timeout_secs = 5

[analysis]
failed_login_exclude = "sudo:"

[analysis.thresholds]
failed_login_high = 20

[hosts.web1]
address = "10.0.0.5"
principal = "audit"
contact = "web-team@example.com"
schedule = { cadence = "weekly", time = "03:30", day = 1 }

[hosts.db1]
address = "db1.internal"
port = 2222
principal = "audit"

[hosts.legacy]
address = "10.0.0.99"
principal = "root"
enabled = false
"#;

    #[test]
    fn parses_sections_and_defaults() {
        let config = AppConfig::parse(SAMPLE).unwrap();

        assert_eq!(config.general.default_contact, "security@example.com");
        assert!(config.general.analysis);
        assert!(config.general.deliver);
        assert_eq!(config.ssh.connect_timeout(), Duration::from_secs(5));
        assert_eq!(config.analysis.failed_login_exclude, "sudo:");
        assert_eq!(config.analysis.max_ports, DEFAULT_MAX_PORTS);
        assert_eq!(config.analysis.thresholds.failed_login_high, 20);
        assert_eq!(config.analysis.thresholds.failed_login_medium, 5);
        assert_eq!(config.smtp.port, 25);
        assert_eq!(config.hosts.len(), 3);
    }

    #[test]
    fn registry_resolves_profiles() {
        let registry = AppConfig::parse(SAMPLE).unwrap().registry();

        let web = registry.get("web1").unwrap();
        assert_eq!(web.port, 22);
        assert_eq!(web.contact, "web-team@example.com");
        let schedule = web.schedule.as_ref().unwrap();
        assert_eq!(schedule.cadence, Some(Cadence::Weekly));
        assert_eq!(schedule.day, Some(1));

        let db = registry.get("db1").unwrap();
        assert_eq!(db.port, 2222);
        assert_eq!(db.contact, "security@example.com");
        assert!(db.schedule.is_none());

        let enabled: Vec<&str> = registry.list_enabled().iter().map(|h| h.name.as_str()).collect();
        assert_eq!(enabled, vec!["db1", "web1"]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn unknown_host_is_configuration_error() {
        let registry = AppConfig::parse(SAMPLE).unwrap().registry();
        let err = registry.get("mail9").unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("mail9"));
    }

    #[test]
    fn missing_principal_is_rejected() {
        let config = AppConfig::parse("[hosts.web1]\naddress = \"10.0.0.5\"\n").unwrap();
        let err = config.registry().get("web1").unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("has no principal"));
    }

    #[test]
    fn missing_address_is_rejected() {
        let config = AppConfig::parse("[hosts.web1]\nprincipal = \"audit\"\n").unwrap();
        let err = config.registry().get("web1").unwrap_err();
        assert!(err.to_string().contains("has no address"));
    }

    #[test]
    fn bad_entry_leaves_other_hosts_usable() {
        let config = AppConfig::parse(
            "[hosts.web1]\naddress = \"10.0.0.5\"\nprincipal = \"audit\"\n\n[hosts.db1]\naddress = \"10.0.0.6\"\n",
        )
        .unwrap();
        let registry = config.registry();

        assert_eq!(registry.get("web1").unwrap().address, "10.0.0.5");
        let enabled: Vec<&str> = registry.list_enabled().iter().map(|h| h.name.as_str()).collect();
        assert_eq!(enabled, vec!["web1"]);

        let rejected: Vec<&RejectedHost> = registry.rejected().collect();
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].name, "db1");
        assert!(rejected[0].enabled);
        assert_eq!(rejected[0].error, "host 'db1' has no principal");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn host_names_and_addresses_are_restricted() {
        let config = AppConfig::parse(
            r#"
[hosts."web 1"]
address = "10.0.0.5"
principal = "audit"

[hosts."web;reboot"]
address = "10.0.0.5"
principal = "audit"

[hosts.optional]
address = "-oProxyCommand=touch /tmp/x"
principal = "audit"

[hosts.sneaky]
address = "10.0.0.5"
principal = "-oProxyCommand=id"

[hosts."app-2.prod_eu"]
address = "10.0.0.7"
principal = "audit"
"#,
        )
        .unwrap();
        let registry = config.registry();

        assert!(registry.get("web 1").unwrap_err().to_string().contains("invalid host name"));
        assert!(registry.get("web;reboot").unwrap_err().to_string().contains("invalid host name"));
        assert!(registry.get("optional").unwrap_err().to_string().contains("invalid address"));
        assert!(registry.get("sneaky").unwrap_err().to_string().contains("invalid principal"));
        assert!(registry.get("app-2.prod_eu").is_ok());
        assert_eq!(registry.rejected().count(), 4);
    }

    #[test]
    fn invalid_toml_is_configuration_error() {
        let err = AppConfig::parse("[hosts.web1\naddress=").unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn validate_accepts_sample() {
        assert!(AppConfig::parse(SAMPLE).unwrap().validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_regex_only() {
        let config = AppConfig::parse(
            "[hosts.web1]\naddress = \"10.0.0.5\"\nprincipal = \"audit\"\nschedule = { cadence = \"daily\", time = \"25:00\" }\n",
        )
        .unwrap();
        assert!(config.validate().is_ok());

        let config = AppConfig::parse("[analysis]\nfailed_login_exclude = \"sudo:(\"\n").unwrap();
        assert!(config.validate().unwrap_err().is_configuration());

        let config = AppConfig::parse(
            "[hosts.web1]\naddress = \"10.0.0.5\"\nprincipal = \"audit\"\nschedule = { cadence = \"daily\" }\n",
        )
        .unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.hosts.len(), 3);

        let err = AppConfig::load_from(Path::new("/nonexistent/hostwatch.toml")).unwrap_err();
        assert!(err.is_configuration());
    }
}
