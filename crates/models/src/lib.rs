//! Domain model for the taskboard client.
//!
//! Entity shapes and JSON field names mirror the backend wire format:
//! camelCase fields, numeric ids, and real-time messages tagged by a
//! SCREAMING_SNAKE_CASE `type` field.

pub mod board;
pub mod comment;
pub mod events;
pub mod task;
pub mod user;

pub use board::{AddMember, Board, CreateBoard, UpdateBoard};
pub use comment::{Comment, CreateComment};
pub use events::{BoardEvent, CommentEvent, Event, TaskEvent, Topic};
pub use task::{CreateTask, Task, TaskPriority, UpdateTask};
pub use user::{AuthResponse, CreateUser, Credentials, User};
