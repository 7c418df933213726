//! Audit stamps for stored entities.
//!
//! Every row carries creation/modification timestamps and a logical-delete
//! flag. The store layer calls the helpers here explicitly at insert,
//! update, and delete time; there is no implicit lifecycle machinery.

use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// Creation/modification timestamps plus a soft-delete flag.
///
/// Composed by value into each entity. The notification core only ever
/// creates stamps and hard-deletes rows; soft-delete marking is performed
/// by other parts of the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStamp {
    /// When the row was inserted.
    pub created_at: SystemTime,
    /// When the row was last modified.
    pub last_modified_at: SystemTime,
    /// Logical-delete flag.
    pub deleted: bool,
}

impl AuditStamp {
    /// Creates a stamp for a freshly inserted row.
    #[must_use]
    pub fn now() -> Self {
        let at = SystemTime::now();
        Self {
            created_at: at,
            last_modified_at: at,
            deleted: false,
        }
    }

    /// Refreshes the modification timestamp. Called by the store layer
    /// before persisting an update.
    pub fn touch(&mut self) {
        self.last_modified_at = SystemTime::now();
    }

    /// Sets the logical-delete flag and refreshes the modification
    /// timestamp.
    pub fn mark_deleted(&mut self) {
        self.deleted = true;
        self.touch();
    }
}

impl Default for AuditStamp {
    fn default() -> Self {
        Self::now()
    }
}
