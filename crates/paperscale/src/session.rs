//! Per-session calibration storage.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::calibration::CalibrationRecord;

/// Key-value store of calibration records, one per session.
///
/// Records are replaced whole; there is no partial update.
pub trait SessionStore: Send + Sync {
    fn get(&self, session: &str) -> Option<CalibrationRecord>;
    fn set(&self, session: &str, record: CalibrationRecord);
}

/// Process-local store for a single server or CLI lifetime.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    records: RwLock<HashMap<String, CalibrationRecord>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, session: &str) -> Option<CalibrationRecord> {
        match self.records.read() {
            Ok(records) => records.get(session).cloned(),
            Err(poisoned) => poisoned.into_inner().get(session).cloned(),
        }
    }

    fn set(&self, session: &str, record: CalibrationRecord) {
        let mut records = match self.records.write() {
            Ok(records) => records,
            Err(poisoned) => poisoned.into_inner(),
        };
        records.insert(session.to_string(), record);
    }
}
