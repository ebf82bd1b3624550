//! Completion counter with a reporting cadence.

use std::sync::atomic::{AtomicUsize, Ordering};

/// Default number of completions between progress log lines.
pub const DEFAULT_PROGRESS_INTERVAL: usize = 50;

/// Counts completed tiles for one zoom level.
#[derive(Debug)]
pub struct ProgressCounter {
    completed: AtomicUsize,
    total: usize,
    interval: usize,
}

impl ProgressCounter {
    /// Creates a counter for `total` tiles that reports every `interval`.
    ///
    /// An interval of 0 disables periodic reports.
    pub fn new(total: usize, interval: usize) -> Self {
        Self {
            completed: AtomicUsize::new(0),
            total,
            interval,
        }
    }

    /// Marks one tile complete.
    ///
    /// Returns the new completion count when it lands on a reporting boundary.
    pub fn record(&self) -> Option<usize> {
        let done = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
        if self.interval > 0 && done % self.interval == 0 {
            Some(done)
        } else {
            None
        }
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Completion percentage, 100 for an empty level.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            self.completed() as f64 / self.total as f64 * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reports_on_interval() {
        let counter = ProgressCounter::new(10, 3);
        let reports: Vec<_> = (0..10).filter_map(|_| counter.record()).collect();
        assert_eq!(reports, vec![3, 6, 9]);
        assert_eq!(counter.completed(), 10);
        assert_eq!(counter.percent(), 100.0);
    }

    #[test]
    fn test_zero_interval_never_reports() {
        let counter = ProgressCounter::new(5, 0);
        assert!((0..5).all(|_| counter.record().is_none()));
    }

    #[test]
    fn test_percent() {
        let counter = ProgressCounter::new(4, DEFAULT_PROGRESS_INTERVAL);
        assert_eq!(counter.percent(), 0.0);
        counter.record();
        assert_eq!(counter.percent(), 25.0);
        assert_eq!(ProgressCounter::new(0, 1).percent(), 100.0);
    }
}
