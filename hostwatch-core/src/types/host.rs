use serde::{Deserialize, Serialize};
use std::fmt;

/// How often a host is audited by the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cadence {
    Daily,
    Weekly,
    Monthly,
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cadence::Daily => write!(f, "daily"),
            Cadence::Weekly => write!(f, "weekly"),
            Cadence::Monthly => write!(f, "monthly"),
        }
    }
}

/// Declared audit schedule of a host.
///
/// Fields are optional because an incomplete policy is only an error once
/// someone tries to install it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulePolicy {
    #[serde(default)]
    pub cadence: Option<Cadence>,

    /// Time of day as "HH:MM"
    #[serde(default)]
    pub time: Option<String>,

    /// Weekday (weekly, 0 = Sunday) or day of month (monthly)
    #[serde(default)]
    pub day: Option<u32>,
}

impl fmt::Display for SchedulePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.cadence, &self.time) {
            (Some(cadence), Some(time)) => match (cadence, self.day) {
                (Cadence::Weekly, Some(day)) => write!(f, "{} (day {}) at {}", cadence, day, time),
                (Cadence::Monthly, Some(day)) => write!(f, "{} (day {}) at {}", cadence, day, time),
                _ => write!(f, "{} at {}", cadence, time),
            },
            _ => write!(f, "incomplete"),
        }
    }
}

/// Connection profile of one audited host, resolved from the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostProfile {
    /// Registry key
    pub name: String,

    /// Hostname or IP address
    pub address: String,

    pub port: u16,

    /// Remote user the audit logs in as
    pub principal: String,

    /// Report recipient
    pub contact: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<SchedulePolicy>,

    pub enabled: bool,
}

impl HostProfile {
    /// Create an enabled profile with the default SSH port and no schedule
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        principal: impl Into<String>,
        contact: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            port: 22,
            principal: principal.into(),
            contact: contact.into(),
            schedule: None,
            enabled: true,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_schedule(mut self, schedule: SchedulePolicy) -> Self {
        self.schedule = Some(schedule);
        self
    }
}
