//! A dedicated worker pool so `numThreads` from the CLI takes effect
//! without mutating rayon's global pool.

use crate::error::Result;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

pub struct WorkerPool {
    pool: ThreadPool,
}

impl WorkerPool {
    /// `requested`: `None` or a non-positive value means "auto" — hardware
    /// concurrency minus one, floored at one thread.
    pub fn new(requested: Option<usize>) -> Self {
        let n = requested
            .filter(|&n| n > 0)
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|p| p.get().saturating_sub(1))
                    .unwrap_or(1)
            })
            .max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(n)
            .build()
            .expect("failed to build worker pool");
        WorkerPool { pool }
    }

    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Runs each task to completion inside the pool, collecting results in
    /// submission order (not completion order) so repeated runs over the
    /// same inputs produce identical output ordering downstream. `Vec`'s
    /// parallel iterator is indexed, so `collect()` preserves that order
    /// regardless of which task finishes first.
    pub fn install_many<T, F>(&self, tasks: Vec<F>) -> Vec<Result<T>>
    where
        T: Send,
        F: FnOnce() -> Result<T> + Send,
    {
        self.pool.install(|| tasks.into_par_iter().map(|f| f()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_tasks_and_preserves_count() {
        let pool = WorkerPool::new(Some(2));
        let tasks: Vec<Box<dyn FnOnce() -> Result<u32> + Send>> = (0..8)
            .map(|i| Box::new(move || Ok(i as u32)) as Box<dyn FnOnce() -> Result<u32> + Send>)
            .collect();
        let results = pool.install_many(tasks);
        assert_eq!(results.len(), 8);
        assert!(results.iter().all(|r| r.is_ok()));
    }
}
