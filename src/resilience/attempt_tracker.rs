use crate::types::Target;
use std::collections::HashMap;
use std::sync::Mutex;

/// Counts failed dispatches per target and decides whether another try is allowed.
///
/// Counts only ever grow; they are never reset for the lifetime of a forwarder.
/// A `max_attempts` of zero means the budget is unlimited.
#[derive(Debug)]
pub struct AttemptTracker {
    max_attempts: u32,
    failures: Mutex<HashMap<Target, u32>>,
}

impl AttemptTracker {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            failures: Mutex::new(HashMap::new()),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn is_unlimited(&self) -> bool {
        self.max_attempts == 0
    }

    /// Record one more failed attempt and return the new count.
    pub fn record_failure(&self, target: &Target) -> u32 {
        let mut failures = self
            .failures
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let count = failures.entry(target.clone()).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    pub fn may_retry(&self, target: &Target) -> bool {
        self.is_unlimited() || self.attempts(target) < self.max_attempts
    }

    /// Failed attempts recorded so far for `target`.
    pub fn attempts(&self, target: &Target) -> u32 {
        self.failures
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(target)
            .copied()
            .unwrap_or(0)
    }

    /// Number of distinct targets that have failed at least once.
    pub fn tracked_targets(&self) -> usize {
        self.failures
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_target_has_zero_attempts() {
        let tracker = AttemptTracker::new(3);
        let t = Target::new("http://a");
        assert_eq!(tracker.attempts(&t), 0);
        assert!(tracker.may_retry(&t));
        assert_eq!(tracker.tracked_targets(), 0);
    }

    #[test]
    fn test_budget_is_exhausted_at_max_attempts() {
        let tracker = AttemptTracker::new(2);
        let t = Target::new("http://a");

        assert_eq!(tracker.record_failure(&t), 1);
        assert!(tracker.may_retry(&t));
        assert_eq!(tracker.record_failure(&t), 2);
        assert!(!tracker.may_retry(&t));
        assert_eq!(tracker.attempts(&t), 2);
    }

    #[test]
    fn test_single_attempt_budget_never_retries() {
        let tracker = AttemptTracker::new(1);
        let t = Target::new("http://a");
        tracker.record_failure(&t);
        assert!(!tracker.may_retry(&t));
    }

    #[test]
    fn test_zero_means_unlimited() {
        let tracker = AttemptTracker::new(0);
        let t = Target::new("http://a");
        for _ in 0..100 {
            tracker.record_failure(&t);
        }
        assert!(tracker.is_unlimited());
        assert!(tracker.may_retry(&t));
        assert_eq!(tracker.attempts(&t), 100);
    }

    #[test]
    fn test_targets_are_counted_independently() {
        let tracker = AttemptTracker::new(2);
        let a = Target::new("http://a");
        let b = Target::new("http://b");
        tracker.record_failure(&a);
        tracker.record_failure(&a);
        tracker.record_failure(&b);
        assert!(!tracker.may_retry(&a));
        assert!(tracker.may_retry(&b));
        assert_eq!(tracker.tracked_targets(), 2);
    }

    #[test]
    fn test_concurrent_failures_are_not_lost() {
        use std::sync::Arc;
        use std::thread;

        let tracker = Arc::new(AttemptTracker::new(0));
        let t = Target::new("http://shared");
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let tr = Arc::clone(&tracker);
                let t = t.clone();
                thread::spawn(move || {
                    for _ in 0..25 {
                        tr.record_failure(&t);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(tracker.attempts(&t), 200);
    }
}
