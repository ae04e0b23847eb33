//! Utility functions and types

mod cancellation;
mod parallel;

pub use cancellation::CancellationToken;
pub use parallel::ParallelConfig;
