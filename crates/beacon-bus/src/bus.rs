//! Bus wiring and process lifecycle.
//!
//! The owning process constructs the bus once at startup and shuts it
//! down in its orderly-teardown sequence; there is no implicit
//! lifecycle. Constructing the bus wires the cleanup queue between the
//! producer and the retention cleaner and starts the cleaner thread.

use std::sync::Arc;

use beacon_store::NotificationStore;

use crate::cleaner::RetentionCleaner;
use crate::config::BusConfig;
use crate::error::BusError;
use crate::observe::{EventSink, TracingSink};
use crate::sender::Sender;

/// A running release notification bus: one producer handle plus the
/// per-process retention cleaner.
///
/// Dropping the bus stops the cleaner; call [`shutdown`](Self::shutdown)
/// instead where teardown errors matter (tests, service stop hooks).
pub struct ReleaseBus {
    sender: Sender,
    cleaner: RetentionCleaner,
}

impl ReleaseBus {
    /// Starts building a bus over `store`.
    #[must_use]
    pub fn builder(store: Arc<dyn NotificationStore>) -> ReleaseBusBuilder {
        ReleaseBusBuilder {
            store,
            sink: None,
            config: BusConfig::default(),
        }
    }

    /// Durably appends a notification. See [`Sender::send`].
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Store`] if the append did not commit.
    pub fn send(&self, payload: &str, topic: &str) -> Result<(), BusError> {
        self.sender.send(payload, topic)
    }

    /// Returns a cloneable producer handle for request threads.
    #[must_use]
    pub fn sender(&self) -> &Sender {
        &self.sender
    }

    /// Returns the retention cleaner handle.
    #[must_use]
    pub fn cleaner(&self) -> &RetentionCleaner {
        &self.cleaner
    }

    /// Stops the cleaner and waits for it to finish its current unit of
    /// work.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::WorkerPanicked`] if the cleaner thread
    /// panicked.
    pub fn shutdown(self) -> Result<(), BusError> {
        self.cleaner.shutdown_and_join()
    }
}

impl std::fmt::Debug for ReleaseBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReleaseBus")
            .field("sender", &self.sender)
            .field("cleaner", &self.cleaner)
            .finish()
    }
}

/// Builder for [`ReleaseBus`].
pub struct ReleaseBusBuilder {
    store: Arc<dyn NotificationStore>,
    sink: Option<Arc<dyn EventSink>>,
    config: BusConfig,
}

impl ReleaseBusBuilder {
    /// Sets the observability sink. Defaults to [`TracingSink`].
    #[must_use]
    pub fn sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Replaces the whole configuration.
    #[must_use]
    pub fn config(mut self, config: BusConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the cleanup queue capacity.
    #[must_use]
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.clean_queue_capacity = capacity;
        self
    }

    /// Sets the retention page size. Treated as at least 1.
    #[must_use]
    pub fn page_size(mut self, size: usize) -> Self {
        self.config.clean_page_size = size;
        self
    }

    /// Wires the queue, spawns the cleaner, and returns the running bus.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::SpawnFailed`] if the cleaner thread cannot be
    /// spawned.
    pub fn start(self) -> Result<ReleaseBus, BusError> {
        let sink = self.sink.unwrap_or_else(|| Arc::new(TracingSink));
        let (tx, rx) = crossbeam_channel::bounded(self.config.clean_queue_capacity);

        let cleaner =
            RetentionCleaner::spawn(Arc::clone(&self.store), Arc::clone(&sink), &self.config, rx)?;
        let sender = Sender::new(self.store, sink, tx);

        Ok(ReleaseBus { sender, cleaner })
    }
}
