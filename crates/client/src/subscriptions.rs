//! Registry of active topic subscriptions.
//!
//! Maps a topic key (`board-5`, `user-boards`, …) to the STOMP
//! subscription id and an optional message handler. Subscribing to a key
//! that is already present overwrites the entry; there is no duplicate
//! detection beyond that. Entries survive a reconnect so the socket task
//! can re-issue SUBSCRIBE frames.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use dashmap::DashMap;
use models::events::Topic;

/// Callback invoked with the raw body of each MESSAGE frame for a key.
pub type MessageHandler = Arc<dyn Fn(&str) + Send + Sync>;

pub struct Subscription {
    pub id: String,
    pub topic: Topic,
    pub handler: Option<MessageHandler>,
}

#[derive(Default)]
pub struct SubscriptionRegistry {
    entries: DashMap<String, Subscription>,
    next_id: AtomicU64,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the subscription for the topic's key.
    ///
    /// Returns the key and the freshly assigned subscription id.
    pub fn insert(&self, topic: Topic, handler: Option<MessageHandler>) -> (String, String) {
        let id = format!("sub-{}", self.next_id.fetch_add(1, Ordering::Relaxed));
        let key = topic.key();
        self.entries.insert(
            key.clone(),
            Subscription {
                id: id.clone(),
                topic,
                handler,
            },
        );
        (key, id)
    }

    /// Remove the entry for a key, returning its subscription id so the
    /// caller can send UNSUBSCRIBE.
    pub fn remove(&self, key: &str) -> Option<String> {
        self.entries.remove(key).map(|(_, sub)| sub.id)
    }

    /// Drop every entry, returning the released subscription ids.
    pub fn clear(&self) -> Vec<String> {
        let keys: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        keys.iter().filter_map(|key| self.remove(key)).collect()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Active topic keys.
    pub fn keys(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.key().clone()).collect()
    }

    /// `(subscription id, destination)` pairs for re-subscribing after a
    /// reconnect.
    pub fn resubscribe_targets(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|e| (e.id.clone(), e.topic.destination()))
            .collect()
    }

    /// Invoke the handler (if any) for the entry owning `subscription_id`
    /// and return its key and topic for event emission.
    ///
    /// The handler runs after the map guard is released, so it may
    /// subscribe or unsubscribe itself.
    pub fn dispatch(&self, subscription_id: &str, body: &str) -> Option<(String, Topic)> {
        let (key, topic, handler) = self.entries.iter().find_map(|entry| {
            (entry.id == subscription_id)
                .then(|| (entry.key().clone(), entry.topic, entry.handler.clone()))
        })?;
        if let Some(handler) = handler {
            handler(body);
        }
        Some((key, topic))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;

    #[test]
    fn insert_is_idempotent_per_key() {
        let registry = SubscriptionRegistry::new();
        let (key_a, id_a) = registry.insert(Topic::Board(5), None);
        let (key_b, id_b) = registry.insert(Topic::Board(5), None);

        assert_eq!(key_a, key_b);
        assert_ne!(id_a, id_b); // replaced handle gets a fresh id
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn remove_returns_the_subscription_id() {
        let registry = SubscriptionRegistry::new();
        let (key, id) = registry.insert(Topic::Task(12), None);

        assert_eq!(registry.remove(&key), Some(id));
        assert!(registry.is_empty());
        assert_eq!(registry.remove(&key), None);
    }

    #[test]
    fn clear_releases_every_handle() {
        let registry = SubscriptionRegistry::new();
        registry.insert(Topic::UserBoards, None);
        registry.insert(Topic::Board(1), None);
        registry.insert(Topic::TaskComments(9), None);

        let released = registry.clear();
        assert_eq!(released.len(), 3);
        assert!(registry.is_empty());
    }

    #[test]
    fn dispatch_runs_the_registered_handler() {
        let registry = SubscriptionRegistry::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let (_, id) = registry.insert(
            Topic::Board(5),
            Some(Arc::new(move |_body: &str| {
                counter.fetch_add(1, Ordering::SeqCst);
            })),
        );

        let routed = registry.dispatch(&id, "{}");
        assert_eq!(routed, Some(("board-5".to_string(), Topic::Board(5))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert_eq!(registry.dispatch("sub-unknown", "{}"), None);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn handler_may_mutate_the_registry() {
        let registry = Arc::new(SubscriptionRegistry::new());
        let inner = registry.clone();
        let (_, id) = registry.insert(
            Topic::Board(5),
            Some(Arc::new(move |_body: &str| {
                inner.insert(Topic::Task(1), None);
            })),
        );

        let routed = registry.dispatch(&id, "{}");
        assert_eq!(routed, Some(("board-5".to_string(), Topic::Board(5))));
        assert!(registry.contains("task-1"));
    }
}
