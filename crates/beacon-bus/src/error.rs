//! Error types for the release notification bus.

use beacon_store::StoreError;

/// Errors surfaced by the bus.
///
/// Only the producer path returns errors to callers; every asynchronous
/// path degrades to "report and continue".
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    /// The durable append failed; nothing was persisted.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The retention cleaner thread could not be spawned.
    #[error("failed to spawn retention cleaner: {0}")]
    SpawnFailed(String),

    /// The retention cleaner thread panicked.
    #[error("retention cleaner panicked")]
    WorkerPanicked,
}
