//! Per-group send cooldown, kept in memory only.
//!
//! Two maps: when we last messaged each group, and any do-not-send-before
//! deadline the server handed us via flood control. Both are lost on
//! restart, which at worst means one extra message per group.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

/// Tracks which groups are ready to receive the next promo message.
pub struct CooldownTracker {
    cooldown: Duration,
    last_sent: HashMap<i64, DateTime<Utc>>,
    deferred: HashMap<i64, DateTime<Utc>>,
}

impl CooldownTracker {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_sent: HashMap::new(),
            deferred: HashMap::new(),
        }
    }

    /// True when the group is outside its cooldown and any deferral.
    pub fn ready(&self, chat_id: i64, now: DateTime<Utc>) -> bool {
        self.remaining(chat_id, now).is_none()
    }

    /// Time left until the group may be messaged again; `None` when ready.
    pub fn remaining(&self, chat_id: i64, now: DateTime<Utc>) -> Option<Duration> {
        let cooldown_end = self.last_sent.get(&chat_id).map(|sent| *sent + self.cooldown);
        let deferred_end = self.deferred.get(&chat_id).copied();
        let until = match (cooldown_end, deferred_end) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        until.filter(|u| *u > now).map(|u| u - now)
    }

    /// Record a successful send. Clears any standing deferral — the server
    /// let the message through, so the deadline is stale.
    pub fn mark_sent(&mut self, chat_id: i64, now: DateTime<Utc>) {
        self.last_sent.insert(chat_id, now);
        self.deferred.remove(&chat_id);
    }

    /// Record a server-requested wait. Keeps the later deadline when one
    /// is already standing.
    pub fn defer_until(&mut self, chat_id: i64, until: DateTime<Utc>) {
        let entry = self.deferred.entry(chat_id).or_insert(until);
        if until > *entry {
            *entry = until;
        }
    }

    /// Move all state from a migrated group id to its replacement.
    pub fn rekey(&mut self, old_id: i64, new_id: i64) {
        if let Some(sent) = self.last_sent.remove(&old_id) {
            self.last_sent.insert(new_id, sent);
        }
        if let Some(deadline) = self.deferred.remove(&old_id) {
            self.deferred.insert(new_id, deadline);
        }
    }

    /// Drop all state for a group we no longer belong to.
    pub fn forget(&mut self, chat_id: i64) {
        self.last_sent.remove(&chat_id);
        self.deferred.remove(&chat_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> CooldownTracker {
        CooldownTracker::new(Duration::hours(2))
    }

    #[test]
    fn test_unseen_group_is_ready() {
        let now = Utc::now();
        assert!(tracker().ready(-1, now));
        assert_eq!(tracker().remaining(-1, now), None);
    }

    #[test]
    fn test_cooldown_window() {
        let mut t = tracker();
        let now = Utc::now();
        t.mark_sent(-1, now);

        assert!(!t.ready(-1, now));
        assert!(!t.ready(-1, now + Duration::minutes(119)));
        assert!(t.ready(-1, now + Duration::hours(2)));
        // other groups are unaffected
        assert!(t.ready(-2, now));
    }

    #[test]
    fn test_remaining_counts_down() {
        let mut t = tracker();
        let now = Utc::now();
        t.mark_sent(-1, now);

        let left = t.remaining(-1, now + Duration::minutes(30)).unwrap();
        assert_eq!(left, Duration::minutes(90));
    }

    #[test]
    fn test_defer_blocks_send() {
        let mut t = tracker();
        let now = Utc::now();
        t.defer_until(-1, now + Duration::seconds(45));

        assert!(!t.ready(-1, now));
        assert!(t.ready(-1, now + Duration::seconds(46)));
    }

    #[test]
    fn test_defer_keeps_later_deadline() {
        let mut t = tracker();
        let now = Utc::now();
        t.defer_until(-1, now + Duration::seconds(60));
        t.defer_until(-1, now + Duration::seconds(10));

        // the shorter deadline does not shrink the standing one
        assert!(!t.ready(-1, now + Duration::seconds(30)));
        assert!(t.ready(-1, now + Duration::seconds(61)));
    }

    #[test]
    fn test_defer_outlasting_cooldown_wins() {
        let mut t = tracker();
        let now = Utc::now();
        t.mark_sent(-1, now);
        t.defer_until(-1, now + Duration::hours(3));

        let left = t.remaining(-1, now).unwrap();
        assert_eq!(left, Duration::hours(3));
    }

    #[test]
    fn test_mark_sent_clears_deferral() {
        let mut t = tracker();
        let now = Utc::now();
        t.defer_until(-1, now + Duration::hours(5));
        t.mark_sent(-1, now);

        // only the regular cooldown remains
        assert!(t.ready(-1, now + Duration::hours(2)));
    }

    #[test]
    fn test_rekey_moves_state() {
        let mut t = tracker();
        let now = Utc::now();
        t.mark_sent(-10, now);
        t.rekey(-10, -1000010);

        assert!(t.ready(-10, now));
        assert!(!t.ready(-1000010, now));
        assert!(t.ready(-1000010, now + Duration::hours(2)));
    }

    #[test]
    fn test_forget_clears_everything() {
        let mut t = tracker();
        let now = Utc::now();
        t.mark_sent(-1, now);
        t.defer_until(-1, now + Duration::hours(9));
        t.forget(-1);

        assert!(t.ready(-1, now));
    }
}
