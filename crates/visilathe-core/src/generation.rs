//! Generation tokens for cooperative cancellation.
//!
//! A [`GenerationCounter`] is shared between the session that schedules work
//! and the worker that executes it. Every restart advances the counter and
//! hands the worker a [`CancelToken`] bound to the new value. Long running
//! computations poll [`CancelToken::is_cancelled`] at their checkpoints and
//! the worker compares generations again before publishing a result, so a
//! result computed for an older generation is never delivered.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Monotonically increasing generation counter.
///
/// Cloning yields another handle to the same counter.
#[derive(Debug, Clone, Default)]
pub struct GenerationCounter {
    current: Arc<AtomicU64>,
}

impl GenerationCounter {
    /// Create a counter starting at generation 0 (nothing issued yet).
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new generation, invalidating every token handed out before.
    pub fn advance(&self) -> CancelToken {
        let generation = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        CancelToken {
            generation,
            counter: Some(self.current.clone()),
        }
    }

    /// The most recently issued generation.
    pub fn current(&self) -> u64 {
        self.current.load(Ordering::SeqCst)
    }

    /// Whether `generation` is still the most recently issued one.
    pub fn is_current(&self, generation: u64) -> bool {
        self.current() == generation
    }
}

/// Token handed to a computation so it can notice that it was superseded.
#[derive(Debug, Clone)]
pub struct CancelToken {
    generation: u64,
    counter: Option<Arc<AtomicU64>>,
}

impl CancelToken {
    /// A token that is never cancelled, for synchronous callers.
    pub fn never() -> Self {
        Self {
            generation: 0,
            counter: None,
        }
    }

    /// The generation this token was issued for.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True once a newer generation has been issued.
    pub fn is_cancelled(&self) -> bool {
        match &self.counter {
            Some(counter) => counter.load(Ordering::SeqCst) != self.generation,
            None => false,
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::never()
    }
}
