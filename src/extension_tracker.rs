//! # Extension Tracker
//!
//! Reference counts shared extension modules across overlapping deployments so
//! that a module is provisioned once and removed only when its last consumer
//! is gone.
//!
//! The tracker is an explicitly constructed object owned by the runtime and
//! shared by reference with the generator and the domain. Counts are keyed by
//! [`ExtensionTracker::key`], i.e. per zone and extension.

use crate::constants::UNTRACKED;
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Default)]
pub struct ExtensionTracker {
    counts: Mutex<HashMap<String, i64>>,
}

impl ExtensionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracking key for an extension provisioned in a zone
    pub fn key(zone: &str, extension: &str) -> String {
        format!("{zone}::{extension}")
    }

    pub fn increment(&self, id: &str) {
        let mut counts = self.counts.lock();
        let count = counts.entry(id.to_string()).or_insert(0);
        *count += 1;
        debug!(extension = %id, count = *count, "Extension reference acquired");
    }

    /// Release one reference
    ///
    /// Returns the remaining count: `0` means the extension can be
    /// un-provisioned, a positive value means other consumers remain, and
    /// [`UNTRACKED`] (`-1`) means the id was not tracked.
    pub fn decrement(&self, id: &str) -> i64 {
        let mut counts = self.counts.lock();
        let Some(count) = counts.get_mut(id) else {
            return UNTRACKED;
        };
        *count -= 1;
        let remaining = *count;
        if remaining <= 0 {
            counts.remove(id);
        }
        debug!(extension = %id, remaining = remaining, "Extension reference released");
        remaining
    }

    /// Current count without changing it; `0` when untracked
    pub fn count(&self, id: &str) -> i64 {
        self.counts.lock().get(id).copied().unwrap_or(0)
    }

    pub fn is_tracked(&self, id: &str) -> bool {
        self.counts.lock().contains_key(id)
    }

    pub fn tracked(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.counts.lock().keys().cloned().collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_increment_decrement_sequence() {
        let tracker = ExtensionTracker::new();
        for _ in 0..3 {
            tracker.increment("X");
        }
        let returns: Vec<i64> = (0..3).map(|_| tracker.decrement("X")).collect();
        assert_eq!(returns, vec![2, 1, 0]);
        assert_eq!(tracker.decrement("X"), -1);
    }

    #[test]
    fn test_unknown_id_is_sentinel_not_error() {
        let tracker = ExtensionTracker::new();
        assert_eq!(tracker.decrement("unknown"), UNTRACKED);
        assert!(!tracker.is_tracked("unknown"));
        assert_eq!(tracker.count("unknown"), 0);
    }

    #[test]
    fn test_concurrent_increments() {
        let tracker = Arc::new(ExtensionTracker::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let tracker = Arc::clone(&tracker);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        tracker.increment("shared");
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(tracker.count("shared"), 800);
    }

    #[test]
    fn test_keys_are_zone_scoped() {
        let tracker = ExtensionTracker::new();
        tracker.increment(&ExtensionTracker::key("zone1", "ext"));
        assert!(tracker.is_tracked("zone1::ext"));
        assert!(!tracker.is_tracked(&ExtensionTracker::key("zone2", "ext")));
        assert_eq!(tracker.tracked(), vec!["zone1::ext".to_string()]);
    }
}
