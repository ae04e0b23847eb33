//! Parallel processing utilities

use crate::error::{Result, ScorecastError};
use serde::{Deserialize, Serialize};

/// Configuration for parallel processing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParallelConfig {
    /// Number of threads (None = rayon's global pool)
    pub n_threads: Option<usize>,
}

impl ParallelConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set number of threads
    pub fn with_threads(mut self, n: usize) -> Self {
        self.n_threads = Some(n);
        self
    }

    /// Get the number of threads to use
    pub fn num_threads(&self) -> usize {
        self.n_threads.unwrap_or_else(rayon::current_num_threads)
    }

    /// Run `f` with every rayon call inside it bound to this configuration
    pub fn install<T, F>(&self, f: F) -> Result<T>
    where
        T: Send,
        F: FnOnce() -> Result<T> + Send,
    {
        match self.n_threads {
            None => f(),
            Some(n) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| ScorecastError::ConfigError(format!("thread pool: {}", e)))?;
                pool.install(f)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;

    #[test]
    fn test_install_bounds_threads() {
        let config = ParallelConfig::new().with_threads(2);
        let seen = config
            .install(|| Ok(rayon::current_num_threads()))
            .unwrap();
        assert_eq!(seen, 2);
    }

    #[test]
    fn test_install_default_pool() {
        let total: i32 = ParallelConfig::new()
            .install(|| Ok((0..100).into_par_iter().sum()))
            .unwrap();
        assert_eq!(total, 4950);
    }
}
