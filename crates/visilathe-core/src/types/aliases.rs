//! Type aliases for shared state that crosses thread boundaries.
//!
//! The interactive session hands data to worker threads (background
//! recomputation, playback clock). These aliases keep the locking flavour
//! consistent between crates.
//!
//! ```rust,ignore
//! use visilathe_core::types::*;
//!
//! let playback: ThreadSafe<SimulationPlayback> = thread_safe(playback);
//! let clock = PlaybackClock::new(playback.clone(), bus)?;
//! playback.lock().play();
//! ```

use parking_lot::Mutex;
use std::sync::Arc;

/// A thread-safe, mutex-protected wrapper for cross-thread sharing.
///
/// Uses `parking_lot::Mutex` for better performance than `std::sync::Mutex`.
pub type ThreadSafe<T> = Arc<Mutex<T>>;

/// Create a new `ThreadSafe<T>` from a value.
#[inline]
pub fn thread_safe<T>(value: T) -> ThreadSafe<T> {
    Arc::new(Mutex::new(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_safe_creation() {
        let value: ThreadSafe<i32> = thread_safe(42);
        assert_eq!(*value.lock(), 42);

        *value.lock() = 100;
        assert_eq!(*value.lock(), 100);
    }

    #[test]
    fn test_shared_across_threads() {
        let counter = thread_safe(0u32);
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let counter = counter.clone();
                std::thread::spawn(move || *counter.lock() += 1)
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(*counter.lock(), 4);
    }
}
