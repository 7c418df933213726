//! In-memory reference store.
//!
//! Backs the notification log with a `BTreeMap` keyed by id, which gives
//! the same ordered-scan shape as an auto-increment primary key. Used by
//! embedding processes that run the bus without a relational backend and
//! by every test in the workspace.

use std::collections::BTreeMap;

use parking_lot::Mutex;

use crate::record::ReleaseEvent;
use crate::store::{NotificationStore, StoreError};

#[derive(Default)]
struct Inner {
    rows: BTreeMap<u64, ReleaseEvent>,
    next_id: u64,
}

/// In-memory [`NotificationStore`].
///
/// Id assignment is monotonic under the store lock, so append order and
/// id order agree even with many concurrent senders.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// Creates an empty store. Ids start at 1.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().rows.len()
    }

    /// True if no rows are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().rows.is_empty()
    }
}

impl NotificationStore for MemoryStore {
    fn append(&self, topic: &str, payload: &str) -> Result<ReleaseEvent, StoreError> {
        let mut inner = self.inner.lock();
        inner.next_id += 1;
        let id = inner.next_id;
        let event = ReleaseEvent::new(id, topic, payload);
        inner.rows.insert(id, event.clone());
        Ok(event)
    }

    fn find_by_id(&self, id: u64) -> Result<Option<ReleaseEvent>, StoreError> {
        Ok(self.inner.lock().rows.get(&id).cloned())
    }

    fn find_older_than(
        &self,
        payload: &str,
        before_id: u64,
        limit: usize,
    ) -> Result<Vec<ReleaseEvent>, StoreError> {
        let inner = self.inner.lock();
        Ok(inner
            .rows
            .range(..before_id)
            .map(|(_, ev)| ev)
            .filter(|ev| ev.payload() == payload)
            .take(limit)
            .cloned()
            .collect())
    }

    fn delete_batch(&self, ids: &[u64]) -> Result<usize, StoreError> {
        let mut inner = self.inner.lock();
        let mut removed = 0;
        for id in ids {
            if inner.rows.remove(id).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn find_newer_than(&self, cursor: u64, limit: usize) -> Result<Vec<ReleaseEvent>, StoreError> {
        use std::ops::Bound;

        let inner = self.inner.lock();
        Ok(inner
            .rows
            .range((Bound::Excluded(cursor), Bound::Unbounded))
            .map(|(_, ev)| ev)
            .take(limit)
            .cloned()
            .collect())
    }

    fn latest_for_payload(&self, payload: &str) -> Result<Option<ReleaseEvent>, StoreError> {
        let inner = self.inner.lock();
        Ok(inner
            .rows
            .values()
            .rev()
            .find(|ev| ev.payload() == payload)
            .cloned())
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("MemoryStore")
            .field("rows", &inner.rows.len())
            .field("next_id", &inner.next_id)
            .finish()
    }
}
