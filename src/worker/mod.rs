// ABOUTME: Worker allocation capability for execution concurrency slots.
// ABOUTME: Two variants share one trait; the choice is wired at construction.

mod pool;
mod singleton;

pub use pool::PooledWorkerAllocator;
pub use singleton::SingletonWorkerAllocator;

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// One slot of execution concurrency inside a function processor.
///
/// Holding a `Worker` grants exclusive use of that slot until it is
/// released. Leases are non-reentrant and non-transferable unless the
/// allocator declares itself shareable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Worker {
    index: usize,
}

impl Worker {
    pub(crate) fn new(index: usize) -> Self {
        Self { index }
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

/// Errors from worker allocation.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("no workers available within {0:?}")]
    NoAvailableWorkers(Duration),
}

/// Snapshot of allocator counters. All values are monotonic; they reset
/// only with the process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllocatorStatistics {
    pub allocations: u64,
    pub success_immediate: u64,
    pub success_after_wait: u64,
    pub timeouts: u64,
    pub wait_ms_sum: u64,
    pub available_sampled_sum: u64,
}

/// Lock-free counters shared by the allocator variants.
#[derive(Debug, Default)]
pub(crate) struct StatisticsCounters {
    allocations: AtomicU64,
    success_immediate: AtomicU64,
    success_after_wait: AtomicU64,
    timeouts: AtomicU64,
    wait_ms_sum: AtomicU64,
    available_sampled_sum: AtomicU64,
}

impl StatisticsCounters {
    /// Count one allocation attempt, sampling the available depth.
    pub(crate) fn record_allocation(&self, available: u64) {
        self.allocations.fetch_add(1, Ordering::Relaxed);
        self.available_sampled_sum
            .fetch_add(available, Ordering::Relaxed);
    }

    pub(crate) fn record_immediate(&self) {
        self.success_immediate.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_after_wait(&self, waited: Duration) {
        self.success_after_wait.fetch_add(1, Ordering::Relaxed);
        self.wait_ms_sum
            .fetch_add(waited.as_millis() as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> AllocatorStatistics {
        AllocatorStatistics {
            allocations: self.allocations.load(Ordering::Relaxed),
            success_immediate: self.success_immediate.load(Ordering::Relaxed),
            success_after_wait: self.success_after_wait.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            wait_ms_sum: self.wait_ms_sum.load(Ordering::Relaxed),
            available_sampled_sum: self.available_sampled_sum.load(Ordering::Relaxed),
        }
    }
}

/// Hands out limited execution workers with bounded-wait semantics.
#[async_trait]
pub trait WorkerAllocator: Send + Sync {
    /// Lease a worker, waiting up to `timeout`. A zero timeout never blocks.
    async fn allocate(&self, timeout: Duration) -> Result<Worker, WorkerError>;

    /// Return a leased worker. Must never block.
    ///
    /// Releasing a worker that does not belong to this allocator is
    /// undefined; the allocator does not validate identity.
    fn release(&self, worker: Worker);

    /// All workers managed by this allocator.
    fn workers(&self) -> Vec<Worker>;

    fn statistics(&self) -> AllocatorStatistics;

    /// Whether leases may cross task boundaries without external
    /// serialization.
    fn shareable(&self) -> bool;
}
