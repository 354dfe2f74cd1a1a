//! Bounded in-memory notification list
//!
//! Per-user lists keep the most recent notifications up to a configured
//! cap; the oldest entries are evicted beyond it. Mutation is limited to
//! read-state transitions.

use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};

use super::Notification;

/// In-memory notification store, newest first per user
pub struct NotificationStore {
    notifications: RwLock<HashMap<String, VecDeque<Notification>>>,
    max_per_user: usize,
}

impl NotificationStore {
    pub fn new(max_per_user: usize) -> Self {
        Self {
            notifications: RwLock::new(HashMap::new()),
            max_per_user,
        }
    }

    /// Insert a notification at the front of the user's list
    pub fn insert(&self, notification: Notification) {
        let mut store = self.notifications.write();
        let list = store
            .entry(notification.user_id.clone())
            .or_default();
        list.push_front(notification);
        list.truncate(self.max_per_user);
    }

    /// Most recent notifications for a user, up to `limit`
    pub fn list(&self, user_id: &str, limit: usize) -> Vec<Notification> {
        self.notifications
            .read()
            .get(user_id)
            .map(|list| list.iter().take(limit).cloned().collect())
            .unwrap_or_default()
    }

    /// Number of unread notifications for a user
    pub fn unread_count(&self, user_id: &str) -> usize {
        self.notifications
            .read()
            .get(user_id)
            .map(|list| list.iter().filter(|n| !n.read).count())
            .unwrap_or(0)
    }

    /// Mark one notification read; false if it does not exist
    pub fn mark_read(&self, user_id: &str, notification_id: &str) -> bool {
        let mut store = self.notifications.write();
        if let Some(list) = store.get_mut(user_id) {
            if let Some(n) = list.iter_mut().find(|n| n.id == notification_id) {
                n.read = true;
                return true;
            }
        }
        false
    }

    /// Mark all of a user's notifications read, returning how many changed
    pub fn mark_all_read(&self, user_id: &str) -> usize {
        let mut store = self.notifications.write();
        let mut changed = 0;
        if let Some(list) = store.get_mut(user_id) {
            for n in list.iter_mut().filter(|n| !n.read) {
                n.read = true;
                changed += 1;
            }
        }
        changed
    }

    /// Total notifications stored for a user
    pub fn total(&self, user_id: &str) -> usize {
        self.notifications
            .read()
            .get(user_id)
            .map(|list| list.len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Severity, SignalKind};

    fn notification(id: &str, user: &str) -> Notification {
        Notification {
            id: id.to_string(),
            user_id: user.to_string(),
            signal_id: "signal_0x1_0".to_string(),
            kind: SignalKind::WhaleBuy,
            severity: Severity::High,
            title: "Whale Buy Alert: ETH".to_string(),
            message: "Whale buy detected".to_string(),
            token_symbol: "ETH".to_string(),
            transaction_hash: "0x1".to_string(),
            value_usd: 600_000.0,
            timestamp: 0,
            read: false,
            sent_via: vec![],
        }
    }

    #[test]
    fn test_insert_and_list_newest_first() {
        let store = NotificationStore::new(100);
        store.insert(notification("n1", "alice"));
        store.insert(notification("n2", "alice"));

        let list = store.list("alice", 50);
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, "n2");
    }

    #[test]
    fn test_cap_evicts_oldest() {
        let store = NotificationStore::new(3);
        for i in 0..5 {
            store.insert(notification(&format!("n{i}"), "alice"));
        }

        let list = store.list("alice", 50);
        assert_eq!(list.len(), 3);
        assert_eq!(list[0].id, "n4");
        assert_eq!(list[2].id, "n2");
    }

    #[test]
    fn test_mark_read() {
        let store = NotificationStore::new(100);
        store.insert(notification("n1", "alice"));
        assert_eq!(store.unread_count("alice"), 1);

        assert!(store.mark_read("alice", "n1"));
        assert_eq!(store.unread_count("alice"), 0);

        assert!(!store.mark_read("alice", "missing"));
        assert!(!store.mark_read("bob", "n1"));
    }

    #[test]
    fn test_mark_all_read() {
        let store = NotificationStore::new(100);
        store.insert(notification("n1", "alice"));
        store.insert(notification("n2", "alice"));

        assert_eq!(store.mark_all_read("alice"), 2);
        assert_eq!(store.unread_count("alice"), 0);
        // Idempotent
        assert_eq!(store.mark_all_read("alice"), 0);
    }

    #[test]
    fn test_users_are_isolated() {
        let store = NotificationStore::new(100);
        store.insert(notification("n1", "alice"));
        assert!(store.list("bob", 50).is_empty());
        assert_eq!(store.total("alice"), 1);
    }
}
