//! The release notification record and the topic contract.

use serde::{Deserialize, Serialize};

use crate::audit::AuditStamp;

/// Topic (channel) names recognized by the bus.
pub mod topic {
    /// The release change channel. The only topic the producer currently
    /// accepts; messages for any other channel are dropped with a warning
    /// before reaching the store.
    pub const RELEASES: &str = "releases";

    /// Returns true if the producer accepts messages on `name`.
    #[must_use]
    pub fn is_supported(name: &str) -> bool {
        name == RELEASES
    }
}

/// One release change event, stored as an append-only row.
///
/// Rows are immutable after creation. For a fixed payload, the id order is
/// the only meaningful order: "newest" is the highest id among rows that
/// share the payload. Many historical rows per payload may coexist; the
/// retention cleaner bounds that growth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseEvent {
    id: u64,
    payload: String,
    topic: String,
    audit: AuditStamp,
}

impl ReleaseEvent {
    /// Creates a record with a store-assigned id and a fresh audit stamp.
    /// Called by store implementations at append time.
    #[must_use]
    pub fn new(id: u64, topic: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            id,
            payload: payload.into(),
            topic: topic.into(),
            audit: AuditStamp::now(),
        }
    }

    /// The store-assigned, strictly increasing identity.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The opaque change key this event notifies about.
    #[must_use]
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// The channel this event was published on.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// The audit stamp attached at append time.
    #[must_use]
    pub fn audit(&self) -> &AuditStamp {
        &self.audit
    }
}

impl std::fmt::Display for ReleaseEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}: {}", self.topic, self.id, self.payload)
    }
}
