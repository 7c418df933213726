//! Retention cleaner background worker.
//!
//! One cleaner thread runs per process embedding the bus. It drains the
//! in-process cleanup queue and deletes rows superseded by a newer row
//! with the same payload, in fixed-size pages. The same worker may run
//! redundantly in sibling processes sharing the store; deletion is
//! idempotent and re-verified, so no coordination is needed between
//! them.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use beacon_store::{NotificationStore, ReleaseEvent, StoreError};
use crossbeam_channel::{Receiver, RecvTimeoutError};

use crate::config::BusConfig;
use crate::error::BusError;
use crate::observe::EventSink;

/// Granularity at which the idle backoff re-checks the stop flag.
const IDLE_SLICE: Duration = Duration::from_millis(100);

/// Handle to the per-process retention cleaner thread.
///
/// The thread stops when [`shutdown`](Self::shutdown) is called, when
/// every queue sender is gone, or via [`Drop`], which signals and joins.
pub struct RetentionCleaner {
    thread: Option<JoinHandle<()>>,
    stop: Arc<AtomicBool>,
    is_running: Arc<AtomicBool>,
    events_cleaned: Arc<AtomicU64>,
}

impl RetentionCleaner {
    /// Spawns the cleaner thread draining `queue`.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::SpawnFailed`] if the thread cannot be spawned.
    pub fn spawn(
        store: Arc<dyn NotificationStore>,
        sink: Arc<dyn EventSink>,
        config: &BusConfig,
        queue: Receiver<u64>,
    ) -> Result<Self, BusError> {
        let stop = Arc::new(AtomicBool::new(false));
        // Marked running here, before the thread starts, so a freshly
        // spawned cleaner never reports as stopped; the worker clears it
        // on exit.
        let is_running = Arc::new(AtomicBool::new(true));
        let events_cleaned = Arc::new(AtomicU64::new(0));

        let worker = Worker {
            store,
            sink,
            queue,
            // A zero page size would make every empty page look full and
            // spin the page loop forever.
            page_size: config.clean_page_size.max(1),
            poll_timeout: config.poll_timeout,
            idle_backoff: config.idle_backoff,
            stop: Arc::clone(&stop),
            is_running: Arc::clone(&is_running),
            events_cleaned: Arc::clone(&events_cleaned),
        };

        let thread = thread::Builder::new()
            .name("beacon-retention-cleaner".to_string())
            .spawn(move || worker.run())
            .map_err(|e| BusError::SpawnFailed(e.to_string()))?;

        Ok(Self {
            thread: Some(thread),
            stop,
            is_running,
            events_cleaned,
        })
    }

    /// True while the cleaner thread is alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::Acquire)
    }

    /// Total rows deleted over the cleaner's lifetime.
    #[must_use]
    pub fn events_cleaned(&self) -> u64 {
        self.events_cleaned.load(Ordering::Relaxed)
    }

    /// Signals the cleaner to stop after its current unit of work.
    pub fn shutdown(&self) {
        self.stop.store(true, Ordering::Release);
    }

    /// Waits for the cleaner thread to finish.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::WorkerPanicked`] if the thread panicked.
    pub fn join(mut self) -> Result<(), BusError> {
        match self.thread.take() {
            Some(handle) => handle.join().map_err(|_| BusError::WorkerPanicked),
            None => Ok(()),
        }
    }

    /// Signals shutdown and waits for the thread to finish.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::WorkerPanicked`] if the thread panicked.
    pub fn shutdown_and_join(self) -> Result<(), BusError> {
        self.shutdown();
        self.join()
    }
}

impl Drop for RetentionCleaner {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

impl std::fmt::Debug for RetentionCleaner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetentionCleaner")
            .field("is_running", &self.is_running())
            .field("events_cleaned", &self.events_cleaned())
            .finish_non_exhaustive()
    }
}

/// State owned by the cleaner thread.
struct Worker {
    store: Arc<dyn NotificationStore>,
    sink: Arc<dyn EventSink>,
    queue: Receiver<u64>,
    page_size: usize,
    poll_timeout: Duration,
    idle_backoff: Duration,
    stop: Arc<AtomicBool>,
    is_running: Arc<AtomicBool>,
    events_cleaned: Arc<AtomicU64>,
}

impl Worker {
    fn run(&self) {
        tracing::debug!("retention cleaner started");

        while !self.stopped() {
            match self.queue.recv_timeout(self.poll_timeout) {
                Ok(id) => {
                    // A failure on one id must never kill the worker.
                    if let Err(error) = self.clean_message(id) {
                        tracing::warn!(%error, id, "retention pass failed");
                        self.sink.log_error(&error);
                    }
                }
                Err(RecvTimeoutError::Timeout) => self.idle_wait(),
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        self.is_running.store(false, Ordering::Release);
        tracing::debug!("retention cleaner stopped");
    }

    fn stopped(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    /// Sleeps for the idle backoff in slices so a stop request is
    /// observed promptly.
    fn idle_wait(&self) {
        let deadline = Instant::now() + self.idle_backoff;
        while !self.stopped() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            thread::sleep(remaining.min(IDLE_SLICE));
        }
    }

    /// Deletes every row superseded by the row with the given id.
    fn clean_message(&self, id: u64) -> Result<(), StoreError> {
        // Double check the row still exists: it may have been removed
        // out-of-band if the release was rolled back after publish.
        let Some(event) = self.store.find_by_id(id)? else {
            tracing::debug!(id, "row gone before cleanup, skipping");
            return Ok(());
        };

        loop {
            let page = self
                .store
                .find_older_than(event.payload(), event.id(), self.page_size)?;
            let full_page = page.len() == self.page_size;

            let ids: Vec<u64> = page.iter().map(ReleaseEvent::id).collect();
            let removed = self.store.delete_batch(&ids)?;
            self.events_cleaned
                .fetch_add(removed as u64, Ordering::Relaxed);

            for stale in &page {
                self.sink.log_event(
                    &format!("release.clean.{}", stale.payload()),
                    &stale.id().to_string(),
                );
            }

            // A non-full page means the backlog is drained. Also stop
            // between pages once shutdown is requested; each page delete
            // is its own atomic unit, so no inconsistent state is left.
            if !full_page || self.stopped() {
                break;
            }
        }

        Ok(())
    }
}
