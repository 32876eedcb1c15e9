// ABOUTME: Integration tests for the worker allocators.
// ABOUTME: Covers contention, FIFO ordering, and statistics accounting.

use funcdock::lifecycle::{ErrorKind, WorkerErrorExt};
use funcdock::worker::{
    PooledWorkerAllocator, SingletonWorkerAllocator, WorkerAllocator, WorkerError,
};
use std::sync::Arc;
use std::time::Duration;

/// Test: Five concurrent callers against a pool of two. Exactly two succeed
/// immediately; the rest time out, and the statistics say so.
#[tokio::test]
async fn pool_contention_times_out_excess_callers() {
    let pool = Arc::new(PooledWorkerAllocator::new(2));

    let tasks: Vec<_> = (0..5)
        .map(|_| {
            let pool = pool.clone();
            tokio::spawn(async move { pool.allocate(Duration::from_millis(100)).await })
        })
        .collect();

    let mut succeeded = 0;
    let mut timed_out = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(WorkerError::NoAvailableWorkers(_)) => timed_out += 1,
        }
    }

    assert_eq!(succeeded, 2);
    assert_eq!(timed_out, 3);

    let stats = pool.statistics();
    assert_eq!(stats.allocations, 5);
    assert_eq!(stats.success_immediate, 2);
    assert_eq!(stats.success_after_wait, 0);
    assert_eq!(stats.timeouts, 3);
}

/// Test: The worker released longest ago is allocated next.
#[tokio::test]
async fn pool_is_fifo_across_releases() {
    let pool = PooledWorkerAllocator::new(3);

    let w0 = pool.allocate(Duration::ZERO).await.unwrap();
    let w1 = pool.allocate(Duration::ZERO).await.unwrap();
    let w2 = pool.allocate(Duration::ZERO).await.unwrap();

    pool.release(w2.clone());
    pool.release(w0.clone());
    pool.release(w1.clone());

    assert_eq!(pool.allocate(Duration::ZERO).await.unwrap(), w2);
    assert_eq!(pool.allocate(Duration::ZERO).await.unwrap(), w0);
    assert_eq!(pool.allocate(Duration::ZERO).await.unwrap(), w1);
}

/// Test: allocations always equals immediate + after-wait + timeouts, under
/// a churn of concurrent lease/release cycles.
#[tokio::test]
async fn statistics_always_balance() {
    let pool = Arc::new(PooledWorkerAllocator::new(2));

    let tasks: Vec<_> = (0..20)
        .map(|i| {
            let pool = pool.clone();
            tokio::spawn(async move {
                let timeout = if i % 3 == 0 {
                    Duration::ZERO
                } else {
                    Duration::from_millis(50)
                };
                if let Ok(worker) = pool.allocate(timeout).await {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    pool.release(worker);
                }
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }

    let stats = pool.statistics();
    assert_eq!(stats.allocations, 20);
    assert_eq!(
        stats.allocations,
        stats.success_immediate + stats.success_after_wait + stats.timeouts
    );
}

/// Test: Zero timeout is strictly non-blocking.
#[tokio::test]
async fn zero_timeout_fails_fast_when_empty() {
    let pool = PooledWorkerAllocator::new(1);
    let _held = pool.allocate(Duration::ZERO).await.unwrap();

    let start = std::time::Instant::now();
    let err = pool.allocate(Duration::ZERO).await.unwrap_err();
    assert!(matches!(err, WorkerError::NoAvailableWorkers(_)));
    assert!(start.elapsed() < Duration::from_millis(50));

    let stats = pool.statistics();
    assert_eq!(stats.timeouts, 1);
}

/// Test: A waiter is satisfied by a release and accounts its wait time.
#[tokio::test]
async fn waiter_accounts_wait_time() {
    let pool = Arc::new(PooledWorkerAllocator::new(1));
    let held = pool.allocate(Duration::ZERO).await.unwrap();

    let waiter = {
        let pool = pool.clone();
        tokio::spawn(async move { pool.allocate(Duration::from_secs(5)).await })
    };
    tokio::time::sleep(Duration::from_millis(30)).await;
    pool.release(held);

    waiter.await.unwrap().unwrap();
    let stats = pool.statistics();
    assert_eq!(stats.success_after_wait, 1);
    assert!(stats.wait_ms_sum >= 10);
}

/// Test: The pool declares itself shareable; the singleton does not.
#[tokio::test]
async fn shareability_is_declared_per_variant() {
    assert!(PooledWorkerAllocator::new(1).shareable());
    assert!(!SingletonWorkerAllocator::new().shareable());
}

/// Test: The singleton always hands out its one worker without waiting.
#[tokio::test]
async fn singleton_allocates_unconditionally() {
    let allocator = SingletonWorkerAllocator::new();

    for _ in 0..3 {
        let worker = allocator.allocate(Duration::ZERO).await.unwrap();
        assert_eq!(worker.index(), 0);
        allocator.release(worker);
    }

    let stats = allocator.statistics();
    assert_eq!(stats.allocations, 3);
    assert_eq!(stats.success_immediate, 3);
    assert_eq!(stats.timeouts, 0);
    assert_eq!(allocator.workers().len(), 1);
}

/// Test: Exhaustion surfaces as the NoAvailableWorkers platform error kind.
#[tokio::test]
async fn exhaustion_maps_to_platform_error_kind() {
    let pool = PooledWorkerAllocator::new(1);
    let _held = pool.allocate(Duration::ZERO).await.unwrap();

    let err = pool
        .allocate(Duration::ZERO)
        .await
        .context_workers()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NoAvailableWorkers);
}

/// Test: The pool reports its full worker set regardless of leases.
#[tokio::test]
async fn pool_reports_all_workers() {
    let pool = PooledWorkerAllocator::new(4);
    let _held = pool.allocate(Duration::ZERO).await.unwrap();
    assert_eq!(pool.workers().len(), 4);
}
