//! Toast notification queue fed by the reconciliation layer and by
//! server-pushed notifications.

use std::sync::{
    RwLock,
    atomic::{AtomicU64, Ordering},
};

use models::events::{NotificationLevel, ServerNotification};
use tokio::sync::broadcast;

/// A queued toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: String,
    pub level: NotificationLevel,
    pub message: String,
}

pub struct NotificationStore {
    toasts: RwLock<Vec<Notification>>,
    next_id: AtomicU64,
    sender: broadcast::Sender<Notification>,
}

impl Default for NotificationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationStore {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(64);
        Self {
            toasts: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(0),
            sender,
        }
    }

    /// Receive each pushed notification as it arrives.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    /// Queue a locally generated toast. Returns its id.
    pub fn push(&self, level: NotificationLevel, message: impl Into<String>) -> String {
        let id = format!("toast-{}", self.next_id.fetch_add(1, Ordering::Relaxed));
        let notification = Notification {
            id: id.clone(),
            level,
            message: message.into(),
        };
        self.toasts.write().unwrap().push(notification.clone());
        let _ = self.sender.send(notification);
        id
    }

    /// Queue a notification pushed by the server, keeping its id.
    pub fn push_server(&self, notification: &ServerNotification) {
        let notification = Notification {
            id: notification.id.clone(),
            level: notification.level,
            message: notification.message.clone(),
        };
        self.toasts.write().unwrap().push(notification.clone());
        let _ = self.sender.send(notification);
    }

    pub fn dismiss(&self, id: &str) {
        self.toasts.write().unwrap().retain(|t| t.id != id);
    }

    pub fn toasts(&self) -> Vec<Notification> {
        self.toasts.read().unwrap().clone()
    }
}
