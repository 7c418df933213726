//! Observability sink contract.
//!
//! The bus reports named events, absorbed errors, and producer
//! transaction outcomes to an external sink. Sink failures must never
//! affect the bus, so every method returns `()` and implementations are
//! expected not to panic.

/// Outcome of one producer transaction (the durable append).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnStatus {
    /// The append committed.
    Success,
    /// The append failed and rolled back.
    Failed,
}

impl std::fmt::Display for TxnStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// External observability collaborator.
///
/// Called at defined points: an event before each append attempt, a
/// transaction outcome after it, one event per record the cleaner
/// removes, and error reports for absorbed cleanup failures.
pub trait EventSink: Send + Sync {
    /// Records a free-form named event.
    fn log_event(&self, name: &str, data: &str);

    /// Records an error absorbed by an asynchronous path.
    fn log_error(&self, error: &dyn std::error::Error);

    /// Records the outcome of a producer transaction.
    fn record_transaction(&self, category: &str, name: &str, status: TxnStatus);
}

/// Sink that forwards everything to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn log_event(&self, name: &str, data: &str) {
        tracing::info!(event = name, data, "bus event");
    }

    fn log_error(&self, error: &dyn std::error::Error) {
        tracing::error!(%error, "bus background error");
    }

    fn record_transaction(&self, category: &str, name: &str, status: TxnStatus) {
        tracing::info!(category, transaction = name, %status, "bus transaction");
    }
}

/// Sink that discards everything. Useful for embedders that wire their
/// own telemetry at a different layer.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn log_event(&self, _name: &str, _data: &str) {}

    fn log_error(&self, _error: &dyn std::error::Error) {}

    fn record_transaction(&self, _category: &str, _name: &str, _status: TxnStatus) {}
}
