use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;

use super::user::User;

/// Holder of the single resolved `Option<User>` value. Writes are atomic
/// replacements; subscribers observe every change through a watch channel and
/// never see an intermediate partial user.
///
/// Session events may overlap while their profile lookups are in flight, so
/// each event takes a monotonically increasing ticket and a resolution is
/// applied only while no newer event has already been applied. Stale
/// resolutions are discarded rather than trusted on raw delivery order.
pub struct SessionStore {
    next_ticket: AtomicU64,
    applied: Mutex<u64>,
    tx: watch::Sender<Option<User>>,
}

impl SessionStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        SessionStore { next_ticket: AtomicU64::new(0), applied: Mutex::new(0), tx }
    }

    /// Snapshot of the currently resolved user.
    pub fn current(&self) -> Option<User> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.tx.subscribe()
    }

    /// Reserve a ticket for a session event about to resolve.
    pub fn begin_event(&self) -> u64 {
        self.next_ticket.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Apply a resolved value for the given ticket. Returns false if a newer
    /// event already applied, in which case the value is dropped.
    pub fn apply(&self, ticket: u64, user: Option<User>) -> bool {
        let mut applied = self.applied.lock();
        if ticket < *applied {
            tracing::debug!("discarding stale session resolution (ticket {} < {})", ticket, *applied);
            return false;
        }
        *applied = ticket;
        self.tx.send_replace(user);
        true
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::user::User;

    #[test]
    fn apply_replaces_current_value() {
        let store = SessionStore::new();
        assert!(store.current().is_none());
        let t = store.begin_event();
        assert!(store.apply(t, Some(User::guest())));
        assert_eq!(store.current().unwrap().id, "guest_user_01");
    }

    #[test]
    fn stale_resolution_is_discarded() {
        let store = SessionStore::new();
        let older = store.begin_event();
        let newer = store.begin_event();
        assert!(store.apply(newer, None));
        // The older event resolves late; its value must not win.
        assert!(!store.apply(older, Some(User::guest())));
        assert!(store.current().is_none());
    }

    #[tokio::test]
    async fn subscribers_observe_replacements() {
        let store = SessionStore::new();
        let mut rx = store.subscribe();
        let t = store.begin_event();
        store.apply(t, Some(User::guest()));
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_some());
        let t2 = store.begin_event();
        store.apply(t2, None);
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_none());
    }
}
