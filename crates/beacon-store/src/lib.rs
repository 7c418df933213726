//! # Beacon Store
//!
//! Notification-record and log-store contract for the Beacon release
//! notification bus.
//!
//! A release notification is an append-only row in an ordered log. The
//! store assigns each row a strictly increasing id, which doubles as the
//! delivery cursor for pollers and as the tie-breaker for "older than"
//! retention queries. This crate defines the record entity, the topic
//! contract, the [`NotificationStore`] trait every backend implements,
//! and an in-memory reference store.

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

/// Audit stamp composed into every stored entity.
pub mod audit;

/// In-memory reference implementation of the store contract.
pub mod memory;

/// The release notification record and topic constants.
pub mod record;

/// The log store trait and its error type.
pub mod store;

pub use audit::AuditStamp;
pub use memory::MemoryStore;
pub use record::{topic, ReleaseEvent};
pub use store::{NotificationStore, StoreError};
