//! Batch evaluation of independent work items.
//!
//! Matrix construction evaluates O(N²) independent pairs. [`BatchProcessor`]
//! maps a function over a slice of work items, using Rayon when the
//! `parallel` feature is enabled and the batch is large enough to amortise
//! the thread-pool overhead.
//!
//! Results always come back in input order, so each output slot is written
//! by exactly one item regardless of how the work was scheduled.
//!
//! # Example
//!
//! ```
//! use asset_graph::batch::BatchProcessor;
//!
//! let squares = BatchProcessor::new()
//!     .min_parallel_threshold(2)
//!     .map(&[1_u64, 2, 3, 4], |x| x * x);
//! assert_eq!(squares, vec![1, 4, 9, 16]);
//! ```

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Default minimum batch size before work is spread across threads.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 64;

/// Order-preserving batch mapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProcessor {
    /// Batches smaller than this run on the calling thread.
    min_parallel_threshold: usize,
}

impl Default for BatchProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchProcessor {
    /// Creates a processor with the default parallel threshold.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            min_parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }

    /// Sets the minimum number of items required to use parallel processing.
    #[must_use]
    pub const fn min_parallel_threshold(mut self, threshold: usize) -> Self {
        self.min_parallel_threshold = threshold;
        self
    }

    /// Returns `true` if a batch of `len` items would be processed in parallel.
    #[must_use]
    pub const fn is_parallel_for(&self, len: usize) -> bool {
        cfg!(feature = "parallel") && len >= self.min_parallel_threshold
    }

    /// Applies `f` to every item, returning results in input order.
    #[cfg(feature = "parallel")]
    pub fn map<I, R, F>(&self, items: &[I], f: F) -> Vec<R>
    where
        I: Sync,
        R: Send,
        F: Fn(&I) -> R + Send + Sync,
    {
        if self.is_parallel_for(items.len()) {
            items.par_iter().map(f).collect()
        } else {
            items.iter().map(f).collect()
        }
    }

    /// Sequential version when the parallel feature is disabled.
    #[cfg(not(feature = "parallel"))]
    pub fn map<I, R, F>(&self, items: &[I], f: F) -> Vec<R>
    where
        F: Fn(&I) -> R,
    {
        items.iter().map(f).collect()
    }
}
