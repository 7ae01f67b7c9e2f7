pub mod crontab;
pub mod memory;

pub use crontab::CrontabStore;
pub use memory::MemoryTriggerStore;

use crate::error::{AuditError, Result};
use crate::types::{Cadence, HostProfile};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tag identifying the triggers this tool owns
pub const DEFAULT_TAG: &str = "hostwatch";

/// Recurring-execution entry bound to one host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleTrigger {
    pub minute: u8,
    pub hour: u8,
    /// `None` means every day of the month
    pub day_of_month: Option<u8>,
    /// `None` means every day of the week
    pub day_of_week: Option<u8>,
    pub host: String,
}

impl ScheduleTrigger {
    /// The five cron time fields; the month is always `*`
    pub fn cron_fields(&self) -> String {
        format!(
            "{} {} {} * {}",
            self.minute,
            self.hour,
            field(self.day_of_month),
            field(self.day_of_week)
        )
    }

    /// Build a trigger from the five cron time fields
    pub fn from_cron_fields(fields: &[&str], host: impl Into<String>) -> Option<Self> {
        let [minute, hour, dom, month, dow] = fields else {
            return None;
        };
        if *month != "*" {
            return None;
        }

        Some(Self {
            minute: minute.parse::<u8>().ok().filter(|m| *m < 60)?,
            hour: hour.parse::<u8>().ok().filter(|h| *h < 24)?,
            day_of_month: parse_field(dom)?,
            day_of_week: parse_field(dow)?,
            host: host.into(),
        })
    }
}

impl fmt::Display for ScheduleTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.cron_fields(), self.host)
    }
}

fn field(value: Option<u8>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "*".to_string())
}

/// `*` → Some(None), number → Some(Some(n)), anything else → None
fn parse_field(value: &str) -> Option<Option<u8>> {
    if value == "*" {
        Some(None)
    } else {
        value.parse().ok().map(Some)
    }
}

/// Persistence for recurring jobs.
///
/// `replace` swaps the whole tagged set in one write; entries without the
/// tag are never touched.
pub trait TriggerStore {
    fn list_tagged(&self, tag: &str) -> Result<Vec<ScheduleTrigger>>;

    fn replace(&self, tag: &str, triggers: &[ScheduleTrigger]) -> Result<()>;
}

/// Map a host's declared cadence to a trigger
pub fn trigger_for(profile: &HostProfile) -> Result<ScheduleTrigger> {
    let policy = profile
        .schedule
        .as_ref()
        .ok_or_else(|| AuditError::config(format!("host '{}' has no schedule", profile.name)))?;

    let cadence = policy
        .cadence
        .ok_or_else(|| AuditError::config(format!("host '{}' schedule has no cadence", profile.name)))?;

    let time = policy
        .time
        .as_deref()
        .ok_or_else(|| AuditError::config(format!("host '{}' schedule has no time", profile.name)))?;

    let (hour, minute) = parse_time(time).ok_or_else(|| {
        AuditError::config(format!(
            "host '{}' schedule time '{}' is not HH:MM",
            profile.name, time
        ))
    })?;

    let (day_of_month, day_of_week) = match cadence {
        Cadence::Daily => (None, None),
        Cadence::Weekly => (None, Some((policy.day.unwrap_or(0) % 7) as u8)),
        Cadence::Monthly => {
            let day = policy.day.unwrap_or(1);
            if !(1..=31).contains(&day) {
                return Err(AuditError::config(format!(
                    "host '{}' monthly schedule day {} is not in 1..=31",
                    profile.name, day
                )));
            }
            (Some(day as u8), None)
        }
    };

    Ok(ScheduleTrigger {
        minute,
        hour,
        day_of_month,
        day_of_week,
        host: profile.name.clone(),
    })
}

/// `HH:MM` as (hour, minute)
pub fn parse_time(time: &str) -> Option<(u8, u8)> {
    let (hour, minute) = time.trim().split_once(':')?;
    let hour: u8 = hour.trim().parse().ok()?;
    let minute: u8 = minute.trim().parse().ok()?;
    if hour < 24 && minute < 60 {
        Some((hour, minute))
    } else {
        None
    }
}

/// Installs and removes per-host triggers in a store.
///
/// Assumes a single invoker: concurrent schedulers on the same store may
/// lose each other's updates.
pub struct Scheduler<S: TriggerStore> {
    store: S,
    tag: String,
}

impl<S: TriggerStore> Scheduler<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            tag: DEFAULT_TAG.to_string(),
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn installed(&self) -> Result<Vec<ScheduleTrigger>> {
        self.store.list_tagged(&self.tag)
    }

    /// Replace any trigger of this host with one matching its current policy
    pub fn install(&self, profile: &HostProfile) -> Result<ScheduleTrigger> {
        let trigger = trigger_for(profile)?;

        let mut triggers: Vec<ScheduleTrigger> = self
            .installed()?
            .into_iter()
            .filter(|t| t.host != profile.name)
            .collect();
        triggers.push(trigger.clone());

        self.store.replace(&self.tag, &triggers)?;
        tracing::info!(host = %profile.name, schedule = %trigger.cron_fields(), "installed audit trigger");
        Ok(trigger)
    }

    /// Remove the trigger of one host; returns whether one existed
    pub fn remove_host(&self, host: &str) -> Result<bool> {
        let installed = self.installed()?;
        let remaining: Vec<ScheduleTrigger> = installed.iter().filter(|t| t.host != host).cloned().collect();

        if remaining.len() == installed.len() {
            tracing::debug!(%host, "no trigger installed");
            return Ok(false);
        }

        self.store.replace(&self.tag, &remaining)?;
        tracing::info!(%host, "removed audit trigger");
        Ok(true)
    }

    /// Remove every trigger carrying this tool's tag; returns how many
    pub fn remove_all(&self) -> Result<usize> {
        let count = self.installed()?.len();
        self.store.replace(&self.tag, &[])?;
        tracing::info!(count, "removed all audit triggers");
        Ok(count)
    }
}
