//! Audit metadata kept alongside persisted resources.
//!
//! Stored with the entity, never part of a representation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditInfo {
    pub date_created: DateTime<Utc>,
    pub date_changed: Option<DateTime<Utc>>,
    pub date_retired: Option<DateTime<Utc>>,
}

impl AuditInfo {
    pub fn created_at(at: DateTime<Utc>) -> Self {
        Self {
            date_created: at,
            date_changed: None,
            date_retired: None,
        }
    }

    pub fn mark_changed(&mut self, at: DateTime<Utc>) {
        self.date_changed = Some(at);
    }

    pub fn mark_retired(&mut self, at: DateTime<Utc>) {
        self.date_retired = Some(at);
        self.date_changed = Some(at);
    }
}
