use super::{ScheduleTrigger, TriggerStore};
use crate::error::{AuditError, Result};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// In-process trigger store, used for dry runs and tests.
///
/// Clones share the same underlying entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryTriggerStore {
    entries: Arc<Mutex<BTreeMap<String, Vec<ScheduleTrigger>>>>,
}

impl MemoryTriggerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TriggerStore for MemoryTriggerStore {
    fn list_tagged(&self, tag: &str) -> Result<Vec<ScheduleTrigger>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| AuditError::Store("lock poisoned".into()))?;
        Ok(entries.get(tag).cloned().unwrap_or_default())
    }

    fn replace(&self, tag: &str, triggers: &[ScheduleTrigger]) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| AuditError::Store("lock poisoned".into()))?;
        if triggers.is_empty() {
            entries.remove(tag);
        } else {
            entries.insert(tag.to_string(), triggers.to_vec());
        }
        Ok(())
    }
}
