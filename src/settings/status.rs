//! In-flight operation bookkeeping.
//!
//! [`AsyncStatusTracker`] maps each [`PendingKey`] to the ticket of the most
//! recent call that started work for it.  A newer call for the same key
//! supersedes the older one: the key stays pending until the newest call
//! settles, and only the newest call may publish its result.
//!
//! Work is bracketed by a [`PendingGuard`].  Dropping the guard ends the
//! operation, so the flag clears on success, on error and when the future
//! running the operation is dropped half-way.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::settings::keys::PendingKey;

#[derive(Debug, Default)]
struct Entries {
    latest: HashMap<PendingKey, u64>,
    next_ticket: u64,
}

/// Set of keys with outstanding work.
///
/// All methods take `&self`; the internal lock is never held across an
/// `.await`.
#[derive(Debug, Default)]
pub struct AsyncStatusTracker {
    entries: Mutex<Entries>,
}

impl AsyncStatusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mark `key` as pending and return the guard for this call.
    pub fn begin(&self, key: PendingKey) -> PendingGuard<'_> {
        let ticket = {
            let mut entries = self.lock();
            entries.next_ticket += 1;
            let ticket = entries.next_ticket;
            entries.latest.insert(key.clone(), ticket);
            ticket
        };
        log::debug!("begin {key} (ticket {ticket})");
        PendingGuard {
            tracker: self,
            key,
            ticket,
        }
    }

    /// Like [`begin`](Self::begin), but only if `key` is not already pending.
    /// Check and insert happen under one lock.
    pub fn try_begin(&self, key: PendingKey) -> Option<PendingGuard<'_>> {
        let ticket = {
            let mut entries = self.lock();
            if entries.latest.contains_key(&key) {
                return None;
            }
            entries.next_ticket += 1;
            let ticket = entries.next_ticket;
            entries.latest.insert(key.clone(), ticket);
            ticket
        };
        Some(PendingGuard {
            tracker: self,
            key,
            ticket,
        })
    }

    /// Clear `key` if `ticket` is still its newest call.  Stale tickets and
    /// absent keys are ignored.
    pub fn end(&self, key: &PendingKey, ticket: u64) {
        let mut entries = self.lock();
        if entries.latest.get(key) == Some(&ticket) {
            entries.latest.remove(key);
        }
    }

    /// Whether any call for `key` is outstanding.  Side-effect free.
    pub fn is_pending(&self, key: &PendingKey) -> bool {
        self.lock().latest.contains_key(key)
    }

    /// Whether `ticket` is the newest call for `key`.
    pub fn is_latest(&self, key: &PendingKey, ticket: u64) -> bool {
        self.lock().latest.get(key) == Some(&ticket)
    }

    /// All keys with outstanding work, in no particular order.
    pub fn pending_keys(&self) -> Vec<PendingKey> {
        self.lock().latest.keys().cloned().collect()
    }
}

// ---------------------------------------------------------------------------
// PendingGuard
// ---------------------------------------------------------------------------

/// Marks one call as in flight for as long as it lives.
#[must_use = "dropping the guard immediately ends the pending operation"]
#[derive(Debug)]
pub struct PendingGuard<'a> {
    tracker: &'a AsyncStatusTracker,
    key: PendingKey,
    ticket: u64,
}

impl PendingGuard<'_> {
    pub fn key(&self) -> &PendingKey {
        &self.key
    }

    pub fn ticket(&self) -> u64 {
        self.ticket
    }

    /// `false` once a newer call for the same key has begun.
    pub fn is_latest(&self) -> bool {
        self.tracker.is_latest(&self.key, self.ticket)
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.tracker.end(&self.key, self.ticket);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::keys::Operation;

    fn key(scope: &str) -> PendingKey {
        PendingKey::scoped(Operation::BaseUrl, scope)
    }

    #[test]
    fn guard_marks_key_pending_until_dropped() {
        let tracker = AsyncStatusTracker::new();
        let guard = tracker.begin(key("groq"));
        assert!(tracker.is_pending(&key("groq")));
        assert!(!tracker.is_pending(&key("openai")));
        drop(guard);
        assert!(!tracker.is_pending(&key("groq")));
    }

    #[test]
    fn end_on_absent_key_is_a_no_op() {
        let tracker = AsyncStatusTracker::new();
        tracker.end(&key("groq"), 42);
        assert!(!tracker.is_pending(&key("groq")));
        assert!(tracker.pending_keys().is_empty());
    }

    #[test]
    fn end_is_idempotent() {
        let tracker = AsyncStatusTracker::new();
        let guard = tracker.begin(key("groq"));
        let ticket = guard.ticket();
        tracker.end(&key("groq"), ticket);
        tracker.end(&key("groq"), ticket);
        assert!(!tracker.is_pending(&key("groq")));
        drop(guard);
        assert!(!tracker.is_pending(&key("groq")));
    }

    #[test]
    fn newer_call_supersedes_older_one() {
        let tracker = AsyncStatusTracker::new();
        let first = tracker.begin(key("groq"));
        let second = tracker.begin(key("groq"));

        assert!(!first.is_latest());
        assert!(second.is_latest());

        // The older call settling must not clear the flag.
        drop(first);
        assert!(tracker.is_pending(&key("groq")));

        drop(second);
        assert!(!tracker.is_pending(&key("groq")));
    }

    #[test]
    fn latest_settling_first_clears_the_flag() {
        let tracker = AsyncStatusTracker::new();
        let first = tracker.begin(key("groq"));
        let second = tracker.begin(key("groq"));

        drop(second);
        assert!(!tracker.is_pending(&key("groq")));
        assert!(!first.is_latest());

        drop(first);
        assert!(!tracker.is_pending(&key("groq")));
    }

    #[test]
    fn try_begin_refuses_a_pending_key() {
        let tracker = AsyncStatusTracker::new();
        let first = tracker.try_begin(key("groq"));
        assert!(first.is_some());
        assert!(tracker.try_begin(key("groq")).is_none());
        assert!(tracker.try_begin(key("openai")).is_some());

        drop(first);
        assert!(tracker.try_begin(key("groq")).is_some());
    }

    #[test]
    fn keys_with_different_scopes_are_independent() {
        let tracker = AsyncStatusTracker::new();
        let groq = tracker.begin(key("groq"));
        let openai = tracker.begin(key("openai"));
        assert!(groq.is_latest());
        assert!(openai.is_latest());

        let mut pending: Vec<String> = tracker
            .pending_keys()
            .iter()
            .map(ToString::to_string)
            .collect();
        pending.sort();
        assert_eq!(
            pending,
            vec!["transcription_base_url:groq", "transcription_base_url:openai"]
        );
    }
}
