//! Duplicate-confirmation guard
//!
//! A workflow confirmation may arrive twice (double-click, two operators).
//! Each apply claims a key derived from the subject identity and the
//! computed target state; the second claim of the same key is refused and
//! the workflow reports a silent no-op.
//!
//! The set is process-local and keys are never removed: a given
//! (identity, dates) pair is not legitimately repeatable within a process
//! lifetime. A restart clears the set, so a crash between claim and record
//! update can allow a duplicate apply afterwards; that is an accepted risk
//! for a single-process deployment. The lock is held only for the
//! check-and-insert, never across side effects.

use std::collections::HashSet;
use std::sync::Mutex;

/// Process-lifetime set of claimed operation keys
#[derive(Debug, Default)]
pub struct PendingOperations {
    claimed: Mutex<HashSet<String>>,
}

impl PendingOperations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim a key; returns false if it was already claimed
    pub fn claim(&self, key: &str) -> bool {
        match self.claimed.lock() {
            Ok(mut set) => set.insert(key.to_string()),
            // A poisoned lock means another claim panicked mid-insert;
            // refuse the claim rather than risk a double apply.
            Err(_) => false,
        }
    }

    /// Number of keys claimed so far
    pub fn len(&self) -> usize {
        self.claimed.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn second_claim_is_refused() {
        let pending = PendingOperations::new();
        assert!(pending.claim("1|2025-01-01|2025-04-01"));
        assert!(!pending.claim("1|2025-01-01|2025-04-01"));
        assert!(pending.claim("1|2025-01-01|2025-05-01"));
        assert_eq!(pending.len(), 2);
    }

    #[test]
    fn racing_claims_admit_exactly_one() {
        let pending = Arc::new(PendingOperations::new());
        let mut handles = Vec::new();
        for _ in 0..16 {
            let pending = Arc::clone(&pending);
            handles.push(std::thread::spawn(move || pending.claim("race-key") as u32));
        }
        let winners: u32 = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(winners, 1);
    }
}
