//! Authentication and socket-connection state.

use std::sync::RwLock;

use models::user::User;
use tokio::sync::broadcast;

/// Which part of the session changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionChange {
    Token,
    User,
    Socket,
}

#[derive(Default)]
struct Inner {
    token: Option<String>,
    user: Option<User>,
    socket_connecting: bool,
    socket_connected: bool,
    socket_error: Option<String>,
}

pub struct SessionStore {
    inner: RwLock<Inner>,
    sender: broadcast::Sender<SessionChange>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(64);
        Self {
            inner: RwLock::new(Inner::default()),
            sender,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionChange> {
        self.sender.subscribe()
    }

    fn notify(&self, change: SessionChange) {
        let _ = self.sender.send(change);
    }

    pub fn token(&self) -> Option<String> {
        self.inner.read().unwrap().token.clone()
    }

    pub fn user(&self) -> Option<User> {
        self.inner.read().unwrap().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.read().unwrap().token.is_some()
    }

    pub fn socket_connecting(&self) -> bool {
        self.inner.read().unwrap().socket_connecting
    }

    pub fn socket_connected(&self) -> bool {
        self.inner.read().unwrap().socket_connected
    }

    /// Last connect/parse error surfaced by the socket, if any.
    pub fn socket_error(&self) -> Option<String> {
        self.inner.read().unwrap().socket_error.clone()
    }

    pub fn set_token(&self, token: Option<String>) {
        self.inner.write().unwrap().token = token;
        self.notify(SessionChange::Token);
    }

    pub fn set_user(&self, user: Option<User>) {
        self.inner.write().unwrap().user = user;
        self.notify(SessionChange::User);
    }

    pub fn set_socket_connecting(&self, connecting: bool) {
        self.inner.write().unwrap().socket_connecting = connecting;
        self.notify(SessionChange::Socket);
    }

    pub fn set_socket_connected(&self, connected: bool) {
        {
            let mut inner = self.inner.write().unwrap();
            inner.socket_connected = connected;
            if connected {
                inner.socket_connecting = false;
                inner.socket_error = None;
            }
        }
        self.notify(SessionChange::Socket);
    }

    pub fn set_socket_error(&self, error: Option<String>) {
        {
            let mut inner = self.inner.write().unwrap();
            inner.socket_error = error;
            inner.socket_connecting = false;
        }
        self.notify(SessionChange::Socket);
    }

    /// Drop all session state (logout).
    pub fn clear(&self) {
        {
            let mut inner = self.inner.write().unwrap();
            *inner = Inner::default();
        }
        self.notify(SessionChange::Token);
        self.notify(SessionChange::User);
        self.notify(SessionChange::Socket);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_resets_everything() {
        let store = SessionStore::new();
        store.set_token(Some("jwt".to_string()));
        store.set_socket_connected(true);
        store.set_socket_error(Some("boom".to_string()));
        assert!(store.is_authenticated());

        store.clear();

        assert!(!store.is_authenticated());
        assert!(store.user().is_none());
        assert!(!store.socket_connected());
        assert!(store.socket_error().is_none());
    }

    #[test]
    fn connecting_flag_clears_on_connect() {
        let store = SessionStore::new();
        store.set_socket_connecting(true);
        store.set_socket_connected(true);
        assert!(!store.socket_connecting());
        assert!(store.socket_error().is_none());
    }
}
