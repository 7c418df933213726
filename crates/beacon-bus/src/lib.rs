//! # Beacon Bus
//!
//! Release notification bus for the Beacon configuration platform.
//!
//! The publishing side appends one [`beacon_store::ReleaseEvent`] row per
//! release change; serving instances poll the shared log for ids newer
//! than their cursor. No broker is involved: the log table is the bus.
//! A per-process background worker bounds log growth by deleting rows
//! superseded by a newer row with the same payload.
//!
//! The producer path is synchronous and transactional; cleanup is
//! asynchronous and best-effort. Losing a cleanup pass costs temporary
//! storage growth, never notification delivery.
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use beacon_bus::ReleaseBus;
//! use beacon_store::{topic, MemoryStore};
//!
//! # fn main() -> Result<(), beacon_bus::BusError> {
//! let store = Arc::new(MemoryStore::new());
//! let bus = ReleaseBus::builder(store).start()?;
//!
//! bus.send("some-app+default+application", topic::RELEASES)?;
//!
//! bus.shutdown()?;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

/// Bus wiring and process lifecycle.
pub mod bus;

/// The retention cleaner background worker.
pub mod cleaner;

/// Bus configuration.
pub mod config;

/// Error types for the bus.
pub mod error;

/// Observability sink contract and built-in sinks.
pub mod observe;

/// The producer.
pub mod sender;

pub use bus::{ReleaseBus, ReleaseBusBuilder};
pub use cleaner::RetentionCleaner;
pub use config::BusConfig;
pub use error::BusError;
pub use observe::{EventSink, NoopSink, TracingSink, TxnStatus};
pub use sender::Sender;
