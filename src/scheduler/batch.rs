//! Bounded batch execution.
//!
//! Runs a batch of independent units with a cap on how many are in flight,
//! then hands back every unit's outcome. A unit that fails does not cancel
//! its siblings; callers decide what a failure means for the batch.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::debug;

/// Outcome of one unit of a batch.
#[derive(Debug)]
pub struct UnitOutcome<K, T, E> {
    pub key: K,
    pub result: Result<T, E>,
}

impl<K, T, E> UnitOutcome<K, T, E> {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Counts of a finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn of<K, T, E>(outcomes: &[UnitOutcome<K, T, E>]) -> Self {
        let succeeded = outcomes.iter().filter(|o| o.is_ok()).count();
        Self {
            succeeded,
            failed: outcomes.len() - succeeded,
        }
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// Runs `work` for every unit, at most `concurrency` at a time.
///
/// Waits for all units and returns their outcomes in input order. A
/// concurrency of 0 is treated as 1.
pub async fn run_bounded<K, T, E, F, Fut>(
    units: Vec<K>,
    concurrency: usize,
    work: F,
) -> Vec<UnitOutcome<K, T, E>>
where
    K: Clone,
    F: Fn(K) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let limit = concurrency.max(1);
    let semaphore = Arc::new(Semaphore::new(limit));
    let started = Instant::now();
    let total = units.len();

    let futures = units.into_iter().map(|key| {
        let semaphore = semaphore.clone();
        let unit = work(key.clone());
        async move {
            // The semaphore is never closed, so acquire cannot fail.
            let _permit = semaphore.acquire().await.ok();
            UnitOutcome {
                key,
                result: unit.await,
            }
        }
    });

    let outcomes = join_all(futures).await;

    let summary = BatchSummary::of(&outcomes);
    debug!(
        total,
        succeeded = summary.succeeded,
        failed = summary.failed,
        concurrency = limit,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Batch finished"
    );

    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_all_outcomes_returned_in_order() {
        let outcomes = run_bounded(vec![1, 2, 3, 4], 2, |n: u32| async move {
            if n % 2 == 0 {
                Err(format!("unit {} failed", n))
            } else {
                Ok(n * 10)
            }
        })
        .await;

        let keys: Vec<u32> = outcomes.iter().map(|o| o.key).collect();
        assert_eq!(keys, vec![1, 2, 3, 4]);
        assert_eq!(outcomes[0].result.as_ref().unwrap(), &10);
        assert!(outcomes[1].result.is_err());
        assert_eq!(outcomes[2].result.as_ref().unwrap(), &30);

        let summary = BatchSummary::of(&outcomes);
        assert_eq!(summary, BatchSummary { succeeded: 2, failed: 2 });
        assert_eq!(summary.total(), 4);
    }

    #[tokio::test]
    async fn test_concurrency_bound_respected() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let outcomes = run_bounded((0..12).collect::<Vec<u32>>(), 3, |_| {
            let in_flight = in_flight.clone();
            let peak = peak.clone();
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                Ok::<(), String>(())
            }
        })
        .await;

        assert_eq!(outcomes.len(), 12);
        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert!(peak.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn test_zero_concurrency_still_runs() {
        let outcomes = run_bounded(vec!["a", "b"], 0, |k| async move { Ok::<_, ()>(k.len()) }).await;
        assert_eq!(BatchSummary::of(&outcomes).succeeded, 2);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let outcomes = run_bounded(Vec::<u32>::new(), 4, |_| async { Ok::<(), ()>(()) }).await;
        assert!(outcomes.is_empty());
    }
}
