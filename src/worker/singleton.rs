// ABOUTME: Singleton worker allocator: exactly one worker, no waiting.
// ABOUTME: Callers must serialize externally; release is a no-op.

use super::{AllocatorStatistics, StatisticsCounters, Worker, WorkerAllocator, WorkerError};
use async_trait::async_trait;
use std::time::Duration;

/// Allocator holding exactly one worker.
///
/// `allocate` hands out the worker unconditionally and immediately;
/// `release` does nothing. Not shareable: appropriate for single-threaded
/// invocation pipelines where the caller serializes access itself.
#[derive(Debug)]
pub struct SingletonWorkerAllocator {
    worker: Worker,
    stats: StatisticsCounters,
}

impl Default for SingletonWorkerAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl SingletonWorkerAllocator {
    pub fn new() -> Self {
        Self {
            worker: Worker::new(0),
            stats: StatisticsCounters::default(),
        }
    }
}

#[async_trait]
impl WorkerAllocator for SingletonWorkerAllocator {
    async fn allocate(&self, _timeout: Duration) -> Result<Worker, WorkerError> {
        self.stats.record_allocation(1);
        self.stats.record_immediate();
        Ok(self.worker.clone())
    }

    fn release(&self, _worker: Worker) {}

    fn workers(&self) -> Vec<Worker> {
        vec![self.worker.clone()]
    }

    fn statistics(&self) -> AllocatorStatistics {
        self.stats.snapshot()
    }

    fn shareable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn always_returns_the_same_worker() {
        let allocator = SingletonWorkerAllocator::new();
        let a = allocator.allocate(Duration::ZERO).await.unwrap();
        let b = allocator.allocate(Duration::ZERO).await.unwrap();
        assert_eq!(a, b);
        assert!(!allocator.shareable());
    }

    #[tokio::test]
    async fn release_is_a_noop() {
        let allocator = SingletonWorkerAllocator::new();
        let worker = allocator.allocate(Duration::ZERO).await.unwrap();
        allocator.release(worker);
        assert!(allocator.allocate(Duration::ZERO).await.is_ok());
    }
}
