use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;

/// A stored cache record. Entries are immutable once inserted; a re-put
/// replaces the whole record with a fresh creation time.
#[derive(Debug, Clone)]
pub struct Entry {
    value: Value,
    creation_time_millis: u64,
    ttl_millis: u64,
    last_modified_millis: u64,
}

impl Entry {
    /// `ttl_millis` of 0 means the entry never expires.
    pub fn new(value: Value, ttl_millis: u64) -> Self {
        let now = now_millis();
        Self {
            value,
            creation_time_millis: now,
            ttl_millis,
            last_modified_millis: now,
        }
    }

    pub fn is_expired(&self, now: u64) -> bool {
        self.ttl_millis > 0 && now.saturating_sub(self.creation_time_millis) > self.ttl_millis
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    pub fn creation_time_millis(&self) -> u64 {
        self.creation_time_millis
    }

    pub fn ttl_millis(&self) -> u64 {
        self.ttl_millis
    }

    pub fn last_modified_millis(&self) -> u64 {
        self.last_modified_millis
    }
}

/// Milliseconds since the Unix epoch.
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
