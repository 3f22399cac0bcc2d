//! Observable in-memory stores for the taskboard client.
//!
//! Each store keeps its collections behind a lock and hands out `Arc`
//! snapshots; every mutation swaps the snapshot and broadcasts a change
//! notification so observers can re-read. [`reconcile`] merges
//! server-pushed events into the stores.

pub mod board;
pub mod notifications;
pub mod reconcile;
pub mod session;

pub use board::{BoardChange, BoardStore};
pub use notifications::{Notification, NotificationStore};
pub use session::{SessionChange, SessionStore};
