//! Configuration for the release notification bus.

use std::time::Duration;

/// Tunables for the bus. The defaults match the production deployment.
#[derive(Debug, Clone)]
pub struct BusConfig {
    /// Capacity of the in-process cleanup queue. Offers beyond capacity
    /// are dropped, trading unreclaimed storage for bounded memory under
    /// publish bursts.
    pub clean_queue_capacity: usize,
    /// Rows fetched and deleted per retention page. A full page means
    /// more superseded rows may remain. Treated as at least 1.
    pub clean_page_size: usize,
    /// How long the cleaner blocks waiting for the next queued id.
    pub poll_timeout: Duration,
    /// How long the cleaner sleeps after an empty poll before retrying.
    pub idle_backoff: Duration,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            clean_queue_capacity: 100,
            clean_page_size: 100,
            poll_timeout: Duration::from_secs(1),
            idle_backoff: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BusConfig::default();
        assert_eq!(config.clean_queue_capacity, 100);
        assert_eq!(config.clean_page_size, 100);
        assert_eq!(config.poll_timeout, Duration::from_secs(1));
        assert_eq!(config.idle_backoff, Duration::from_secs(5));
    }
}
