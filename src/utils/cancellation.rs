//! Cooperative cancellation for long-running training loops

use crate::error::{Result, ScorecastError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared cancel flag with an optional deadline.
///
/// Clones share the same flag, so any clone can stop every loop that checks it.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token that trips on its own once `timeout` has elapsed from now
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            flag: Arc::default(),
            deadline: Instant::now().checked_add(timeout),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst) || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// `Err(Cancelled)` naming `stage` once the token has tripped
    pub fn check(&self, stage: &str) -> Result<()> {
        if self.flag.load(Ordering::SeqCst) {
            return Err(ScorecastError::Cancelled(format!("cancelled during {}", stage)));
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(ScorecastError::Cancelled(format!("deadline exceeded during {}", stage)));
        }
        Ok(())
    }
}
