//! Run statistics tracking.
//!
//! Thread-safe per-run counters for the failure categories in
//! [`super::types::ErrorType`]. Shared across tasks via `Arc`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use strum::IntoEnumIterator;

use super::types::ErrorType;

/// Thread-safe processing statistics tracker.
///
/// All counters are initialized to zero on creation, so incrementing never
/// allocates and lookups cannot miss.
pub struct ProcessingStats {
    errors: HashMap<ErrorType, AtomicUsize>,
}

impl ProcessingStats {
    pub fn new() -> Self {
        let mut errors = HashMap::new();
        for error in ErrorType::iter() {
            errors.insert(error, AtomicUsize::new(0));
        }
        ProcessingStats { errors }
    }

    /// Increment the counter for an error category.
    pub fn increment(&self, error: ErrorType) {
        if let Some(counter) = self.errors.get(&error) {
            counter.fetch_add(1, Ordering::Relaxed);
        } else {
            log::error!(
                "Attempted to increment counter for {:?} which is not in the map. \
                 This indicates a bug in ProcessingStats initialization.",
                error
            );
        }
    }

    /// Count for a single error category.
    pub fn count(&self, error: ErrorType) -> usize {
        self.errors
            .get(&error)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// Total errors across all categories.
    pub fn total(&self) -> usize {
        self.errors
            .values()
            .map(|c| c.load(Ordering::SeqCst))
            .sum()
    }

    /// Logs a summary of non-zero counters at the end of a run.
    pub fn log_summary(&self) {
        let total = self.total();
        if total == 0 {
            log::info!("No errors encountered");
            return;
        }
        log::info!("Errors encountered: {}", total);
        for error in ErrorType::iter() {
            let count = self.count(error);
            if count > 0 {
                log::info!("  {}: {}", error, count);
            }
        }
    }
}

impl Default for ProcessingStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        let stats = ProcessingStats::new();
        for error in ErrorType::iter() {
            assert_eq!(stats.count(error), 0);
        }
        assert_eq!(stats.total(), 0);
    }

    #[test]
    fn test_increment_and_total() {
        let stats = ProcessingStats::new();
        stats.increment(ErrorType::NavigationError);
        stats.increment(ErrorType::NavigationError);
        stats.increment(ErrorType::PersistenceError);
        assert_eq!(stats.count(ErrorType::NavigationError), 2);
        assert_eq!(stats.count(ErrorType::PersistenceError), 1);
        assert_eq!(stats.total(), 3);
    }
}
