//! The notification log store contract.

use crate::record::ReleaseEvent;

/// Errors from notification store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing store could not be reached or the write did not
    /// complete. Nothing was persisted.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The append violated a store constraint.
    #[error("constraint violation: {0}")]
    Constraint(String),
}

/// Durable, ordered-by-id collection of [`ReleaseEvent`] rows.
///
/// Ids are assigned by the store and strictly increase in append order;
/// they are globally ordered across every process sharing the store.
/// Implementations must make `append` a single atomic unit (a failed
/// append persists nothing) and `delete_batch` idempotent, because the
/// retention cleaner runs redundantly in sibling processes with no
/// coordination.
pub trait NotificationStore: Send + Sync {
    /// Appends one record, assigning the next id and a fresh audit stamp.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write did not complete; on error no
    /// partial row is visible to any reader.
    fn append(&self, topic: &str, payload: &str) -> Result<ReleaseEvent, StoreError>;

    /// Point lookup by id. `Ok(None)` if the row does not (or no longer)
    /// exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be read.
    fn find_by_id(&self, id: u64) -> Result<Option<ReleaseEvent>, StoreError>;

    /// Returns up to `limit` rows with the same `payload` and an id
    /// strictly less than `before_id`, ascending by id.
    ///
    /// This is the retention cleaner's paging query: a full page means
    /// more superseded rows may remain.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be read.
    fn find_older_than(
        &self,
        payload: &str,
        before_id: u64,
        limit: usize,
    ) -> Result<Vec<ReleaseEvent>, StoreError>;

    /// Hard-deletes the given ids in one atomic unit, skipping ids that
    /// are already gone. Returns the number of rows actually removed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the delete did not complete.
    fn delete_batch(&self, ids: &[u64]) -> Result<usize, StoreError>;

    /// Returns up to `limit` rows with an id strictly greater than
    /// `cursor`, ascending by id. This is the poll query of downstream
    /// scanners: "does anything newer than what I have seen exist".
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be read.
    fn find_newer_than(&self, cursor: u64, limit: usize) -> Result<Vec<ReleaseEvent>, StoreError>;

    /// Returns the row with the highest id for `payload`, if any.
    /// Multiple rows per payload are redundant to consumers; only the
    /// latest matters for notification purposes.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be read.
    fn latest_for_payload(&self, payload: &str) -> Result<Option<ReleaseEvent>, StoreError>;
}
