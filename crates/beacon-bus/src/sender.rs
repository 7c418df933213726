//! The producer side of the bus.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use beacon_store::{topic, NotificationStore};

use crate::error::BusError;
use crate::observe::{EventSink, TxnStatus};

/// Sink event emitted before every append attempt.
pub(crate) const SEND_EVENT: &str = "bus.release.message";
/// Transaction category/name for the producer path.
pub(crate) const TXN_CATEGORY: &str = "bus.sender";
pub(crate) const TXN_NAME: &str = "send";

/// Appends release change notifications to the shared log.
///
/// Cloneable and safe to call from many request threads concurrently;
/// clones share the cleanup queue and the drop counter.
#[derive(Clone)]
pub struct Sender {
    store: Arc<dyn NotificationStore>,
    sink: Arc<dyn EventSink>,
    clean_tx: crossbeam_channel::Sender<u64>,
    cleanups_dropped: Arc<AtomicU64>,
}

impl Sender {
    pub(crate) fn new(
        store: Arc<dyn NotificationStore>,
        sink: Arc<dyn EventSink>,
        clean_tx: crossbeam_channel::Sender<u64>,
    ) -> Self {
        Self {
            store,
            sink,
            clean_tx,
            cleanups_dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Durably appends a notification for `payload` on `topic`.
    ///
    /// A topic other than the supported channel is a no-op: it logs a
    /// warning and returns `Ok(())` without touching the store or the
    /// cleanup queue. On a successful append the new id is offered to the
    /// cleanup queue without blocking; a full queue drops it (cleanup is
    /// best-effort and delivery does not depend on it).
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Store`] if the append did not commit. The
    /// failure leaves no partial row, so to downstream pollers a failed
    /// send is indistinguishable from no change at all.
    pub fn send(&self, payload: &str, topic_name: &str) -> Result<(), BusError> {
        tracing::info!(payload, topic = topic_name, "sending release notification");
        if !topic::is_supported(topic_name) {
            tracing::warn!(topic = topic_name, "topic not supported by the release bus");
            return Ok(());
        }

        self.sink.log_event(SEND_EVENT, payload);
        match self.store.append(topic_name, payload) {
            Ok(event) => {
                if self.clean_tx.try_send(event.id()).is_err() {
                    // Queue full (or cleaner gone): expected under load.
                    self.cleanups_dropped.fetch_add(1, Ordering::Relaxed);
                }
                self.sink
                    .record_transaction(TXN_CATEGORY, TXN_NAME, TxnStatus::Success);
                Ok(())
            }
            Err(error) => {
                tracing::error!(%error, payload, "appending release notification failed");
                self.sink
                    .record_transaction(TXN_CATEGORY, TXN_NAME, TxnStatus::Failed);
                Err(error.into())
            }
        }
    }

    /// Number of cleanup offers dropped because the queue was full.
    #[must_use]
    pub fn cleanups_dropped(&self) -> u64 {
        self.cleanups_dropped.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sender")
            .field("queued", &self.clean_tx.len())
            .field("cleanups_dropped", &self.cleanups_dropped())
            .finish_non_exhaustive()
    }
}
