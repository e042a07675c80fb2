// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pool of postprocess workers, grown lazily up to a configurable limit.

use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::errors::WorkerError;
use crate::worker::Worker;

/// How many workers the pool is allowed to hold at once. Mirrors the
/// engine's own concurrency cap (`std::thread::available_parallelism`) by
/// default, but is set explicitly by the caller so postprocess concurrency
/// can be tuned independently of compile concurrency.
pub type CalculateMax = Arc<dyn Fn() -> usize + Send + Sync>;

pub struct Pool {
    script: PathBuf,
    workers: Mutex<Vec<Arc<Worker>>>,
    next_id: AtomicU64,
    calculate_max: Mutex<CalculateMax>,
}

impl Pool {
    pub fn new(script: PathBuf) -> Self {
        Self {
            script,
            workers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
            calculate_max: Mutex::new(Arc::new(|| {
                std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4)
            })),
        }
    }

    pub fn set_calculate_max(&self, calculate_max: CalculateMax) {
        *self.calculate_max.lock() = calculate_max;
    }

    pub fn limit(&self) -> usize {
        (self.calculate_max.lock())()
    }

    pub fn worker_count(&self) -> usize {
        self.workers.lock().len()
    }

    /// Returns an idle worker, reusing one already in the pool, spawning a
    /// fresh one if under the limit, or waiting for the caller to retry if
    /// the pool is saturated and nothing is idle (`Busy` is itself a signal
    /// to requeue — the engine already does this for compiles).
    pub async fn get_or_create_available_worker(&self) -> Result<Arc<Worker>, WorkerError> {
        {
            let mut workers = self.workers.lock();
            workers.retain(|w| w.state() != crate::worker::WorkerState::Terminated);
            if let Some(worker) = workers.iter().find(|w| w.is_idle()) {
                return Ok(Arc::clone(worker));
            }
            if workers.len() >= self.limit() {
                return Err(WorkerError::PoolSaturated);
            }
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let worker = Arc::new(Worker::spawn(id, self.script.clone()).await?);
        self.workers.lock().push(Arc::clone(&worker));
        Ok(worker)
    }

    /// Terminates every worker in the pool. Called on `hot` restart and on
    /// process exit.
    pub async fn terminate(&self) {
        let workers: Vec<_> = self.workers.lock().drain(..).collect();
        for worker in workers {
            worker.terminate().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limit_matches_available_parallelism() {
        let pool = Pool::new(PathBuf::from("postprocess.js"));
        assert!(pool.limit() >= 1);
    }

    #[test]
    fn calculate_max_can_be_overridden() {
        let pool = Pool::new(PathBuf::from("postprocess.js"));
        pool.set_calculate_max(Arc::new(|| 2));
        assert_eq!(pool.limit(), 2);
    }

    #[tokio::test]
    async fn pool_at_limit_refuses_new_workers() {
        let pool = Pool::new(PathBuf::from("/no/such/script.js"));
        pool.set_calculate_max(Arc::new(|| 0));
        let result = pool.get_or_create_available_worker().await;
        assert!(matches!(result, Err(WorkerError::PoolSaturated)));
    }
}
