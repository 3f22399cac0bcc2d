//! Networking layer for the taskboard client.
//!
//! [`http::ApiClient`] wraps the REST API with bearer-token auth; the
//! per-resource services ([`boards`], [`tasks`], [`comments`], [`users`],
//! [`auth`]) are thin wrappers over it. [`socket::SocketClient`] keeps a
//! STOMP-over-WebSocket connection alive and [`session::Session`] ties
//! the two together with the stores.

pub mod auth;
pub mod boards;
pub mod comments;
pub mod config;
pub mod error;
pub mod http;
pub mod session;
pub mod socket;
pub mod stomp;
pub mod subscriptions;
pub mod tasks;
pub mod users;

pub use config::ClientConfig;
pub use error::ApiError;
pub use http::ApiClient;
pub use session::Session;
