/// Point-in-time snapshot of a pool's queues and worker registry.
///
/// Every field is a best-effort observation; under concurrent activity the
/// numbers are stale as soon as the snapshot is taken.
#[derive(Debug, Clone)]
pub struct PoolMetrics {
    /// Items enqueued but not yet picked up by a worker.
    pub pending_items: usize,
    /// Results waiting to be retrieved.
    pub ready_results: usize,
    /// Registered workers whose threads are still running.
    pub live_workers: usize,
    /// All registered workers, running or terminated.
    pub registered_workers: usize,
}

impl PoolMetrics {
    /// True once the work queue has reached zero pending items.
    pub fn is_drained(&self) -> bool {
        self.pending_items == 0
    }

    /// Fraction of registered workers still running.
    pub fn utilization(&self) -> f64 {
        if self.registered_workers == 0 {
            return 0.0;
        }
        self.live_workers as f64 / self.registered_workers as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utilization_handles_the_empty_registry() {
        let metrics = PoolMetrics {
            pending_items: 0,
            ready_results: 0,
            live_workers: 0,
            registered_workers: 0,
        };
        assert!(metrics.is_drained());
        assert_eq!(metrics.utilization(), 0.0);
    }

    #[test]
    fn utilization_is_a_fraction_of_registered_workers() {
        let metrics = PoolMetrics {
            pending_items: 3,
            ready_results: 1,
            live_workers: 2,
            registered_workers: 4,
        };
        assert!(!metrics.is_drained());
        assert_eq!(metrics.utilization(), 0.5);
    }
}
