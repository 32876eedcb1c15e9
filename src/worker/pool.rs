// ABOUTME: Fixed-pool worker allocator backed by a bounded FIFO channel.
// ABOUTME: Pre-populated at construction; release must never block.

use super::{AllocatorStatistics, StatisticsCounters, Worker, WorkerAllocator, WorkerError};
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::time::Instant;

/// Allocator holding N workers in a bounded FIFO queue of capacity N.
///
/// The queue is pre-populated at construction, so a full queue on release
/// can only mean a double release. FIFO holds across one allocator: the
/// worker released longest ago is allocated next. No fairness guarantee
/// exists between concurrent blocked allocators beyond what the scheduler
/// provides.
pub struct PooledWorkerAllocator {
    tx: mpsc::Sender<Worker>,
    rx: tokio::sync::Mutex<mpsc::Receiver<Worker>>,
    size: usize,
    stats: StatisticsCounters,
}

impl PooledWorkerAllocator {
    /// Create a pool of `size` workers, all immediately available.
    pub fn new(size: usize) -> Self {
        assert!(size > 0, "worker pool requires at least one worker");
        let (tx, rx) = mpsc::channel(size);
        for index in 0..size {
            tx.try_send(Worker::new(index))
                .unwrap_or_else(|_| unreachable!("populating a channel sized to fit"));
        }
        Self {
            tx,
            rx: tokio::sync::Mutex::new(rx),
            size,
            stats: StatisticsCounters::default(),
        }
    }

    /// Current number of idle workers in the queue.
    fn available(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }
}

#[async_trait]
impl WorkerAllocator for PooledWorkerAllocator {
    async fn allocate(&self, timeout: Duration) -> Result<Worker, WorkerError> {
        let deadline = Instant::now() + timeout;
        self.stats.record_allocation(self.available() as u64);

        // Receiver access serializes through the mutex; the deadline covers
        // both the mutex wait and the channel wait.
        let mut rx = match tokio::time::timeout_at(deadline, self.rx.lock()).await {
            Ok(guard) => guard,
            Err(_) => {
                self.stats.record_timeout();
                return Err(WorkerError::NoAvailableWorkers(timeout));
            }
        };

        match rx.try_recv() {
            Ok(worker) => {
                self.stats.record_immediate();
                return Ok(worker);
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                unreachable!("allocator holds the sender for its own pool")
            }
        }

        if timeout.is_zero() {
            self.stats.record_timeout();
            return Err(WorkerError::NoAvailableWorkers(timeout));
        }

        let wait_start = Instant::now();
        match tokio::time::timeout_at(deadline, rx.recv()).await {
            Ok(Some(worker)) => {
                self.stats.record_after_wait(wait_start.elapsed());
                Ok(worker)
            }
            Ok(None) => unreachable!("allocator holds the sender for its own pool"),
            Err(_) => {
                self.stats.record_timeout();
                Err(WorkerError::NoAvailableWorkers(timeout))
            }
        }
    }

    fn release(&self, worker: Worker) {
        // Capacity equals population; a full queue means a double release
        if self.tx.try_send(worker).is_err() {
            tracing::error!("worker released into a full pool; dropping it");
        }
    }

    fn workers(&self) -> Vec<Worker> {
        (0..self.size).map(Worker::new).collect()
    }

    fn statistics(&self) -> AllocatorStatistics {
        self.stats.snapshot()
    }

    fn shareable(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn zero_timeout_never_blocks() {
        let pool = PooledWorkerAllocator::new(1);
        let worker = pool.allocate(Duration::ZERO).await.unwrap();
        let err = pool.allocate(Duration::ZERO).await.unwrap_err();
        assert!(matches!(err, WorkerError::NoAvailableWorkers(_)));
        pool.release(worker);
    }

    #[tokio::test]
    async fn released_worker_is_allocatable_again() {
        let pool = PooledWorkerAllocator::new(1);
        let worker = pool.allocate(Duration::ZERO).await.unwrap();
        pool.release(worker.clone());
        let again = pool.allocate(Duration::ZERO).await.unwrap();
        assert_eq!(worker, again);
    }

    #[tokio::test]
    async fn waiting_allocation_succeeds_when_released() {
        let pool = std::sync::Arc::new(PooledWorkerAllocator::new(1));
        let worker = pool.allocate(Duration::ZERO).await.unwrap();

        let waiter = {
            let pool = pool.clone();
            tokio::spawn(async move { pool.allocate(Duration::from_secs(5)).await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        pool.release(worker);

        let allocated = waiter.await.unwrap().unwrap();
        assert_eq!(allocated.index(), 0);
        let stats = pool.statistics();
        assert_eq!(stats.success_after_wait, 1);
    }
}
