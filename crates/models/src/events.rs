//! Real-time messages pushed over the board/task/comment topics.
//!
//! Messages are JSON objects tagged by a `type` field
//! (e.g. `BOARD_CREATED`, `TASK_DELETED`) with camelCase payload fields.
//! Deletion messages carry only the deleted entity id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{board::Board, comment::Comment, task::Task};

/// A topic a client can subscribe to for push updates.
///
/// `key()` is the stable registry key for a subscription;
/// `destination()` is the broker destination sent in SUBSCRIBE frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Board membership changes scoped to the logged-in user.
    UserBoards,
    /// Updates to a single board.
    Board(i64),
    /// Task creation on a board.
    BoardTasks(i64),
    /// Updates to a single task.
    Task(i64),
    /// Comment activity on a task.
    TaskComments(i64),
}

impl Topic {
    /// Registry key identifying this subscription.
    pub fn key(&self) -> String {
        match self {
            Topic::UserBoards => "user-boards".to_string(),
            Topic::Board(id) => format!("board-{id}"),
            Topic::BoardTasks(id) => format!("board-tasks-{id}"),
            Topic::Task(id) => format!("task-{id}"),
            Topic::TaskComments(id) => format!("comment-{id}"),
        }
    }

    /// Broker destination for SUBSCRIBE frames.
    pub fn destination(&self) -> String {
        match self {
            Topic::UserBoards => "/user/topic/boards".to_string(),
            Topic::Board(id) => format!("/topic/boards/{id}"),
            Topic::BoardTasks(id) => format!("/topic/boards/{id}/tasks"),
            Topic::Task(id) => format!("/topic/tasks/{id}"),
            Topic::TaskComments(id) => format!("/topic/tasks/{id}/comments"),
        }
    }

    /// Recover the topic from a MESSAGE frame's destination header.
    pub fn from_destination(destination: &str) -> Option<Topic> {
        if destination == "/user/topic/boards" {
            return Some(Topic::UserBoards);
        }
        let rest = destination.strip_prefix("/topic/")?;
        let segments: Vec<&str> = rest.split('/').collect();
        match segments.as_slice() {
            ["boards", id] => Some(Topic::Board(id.parse().ok()?)),
            ["boards", id, "tasks"] => Some(Topic::BoardTasks(id.parse().ok()?)),
            ["tasks", id] => Some(Topic::Task(id.parse().ok()?)),
            ["tasks", id, "comments"] => Some(Topic::TaskComments(id.parse().ok()?)),
            _ => None,
        }
    }
}

/// Messages on `/topic/boards/{id}` and `/user/topic/boards`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum BoardEvent {
    #[serde(rename = "BOARD_CREATED")]
    Created {
        board: Board,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<DateTime<Utc>>,
    },
    #[serde(rename = "BOARD_UPDATED")]
    Updated {
        board: Board,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<DateTime<Utc>>,
    },
    #[serde(rename = "MEMBER_ADDED")]
    MemberAdded {
        board: Board,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<DateTime<Utc>>,
    },
    #[serde(rename = "MEMBER_REMOVED")]
    MemberRemoved {
        board: Board,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<DateTime<Utc>>,
    },
    #[serde(rename = "BOARD_DELETED")]
    Deleted {
        deleted_board_id: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<DateTime<Utc>>,
    },
}

/// Messages on `/topic/tasks/{id}` and `/topic/boards/{id}/tasks`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum TaskEvent {
    #[serde(rename = "TASK_CREATED")]
    Created {
        task: Task,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        board_id: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<DateTime<Utc>>,
    },
    #[serde(rename = "TASK_UPDATED")]
    Updated {
        task: Task,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        board_id: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<DateTime<Utc>>,
    },
    #[serde(rename = "TASK_MOVED")]
    Moved {
        task: Task,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        board_id: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<DateTime<Utc>>,
    },
    #[serde(rename = "TASK_ASSIGNED")]
    Assigned {
        task: Task,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        board_id: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<DateTime<Utc>>,
    },
    #[serde(rename = "TASK_DELETED")]
    Deleted {
        deleted_task_id: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        board_id: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<DateTime<Utc>>,
    },
}

/// Messages on `/topic/tasks/{id}/comments`.
///
/// Deletion carries the full comment, not just the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum CommentEvent {
    #[serde(rename = "COMMENT_CREATED")]
    Created {
        comment: Comment,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        task_id: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        board_id: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<DateTime<Utc>>,
    },
    #[serde(rename = "COMMENT_UPDATED")]
    Updated {
        comment: Comment,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        task_id: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        board_id: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<DateTime<Utc>>,
    },
    #[serde(rename = "COMMENT_DELETED")]
    Deleted {
        comment: Comment,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        task_id: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        board_id: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<DateTime<Utc>>,
    },
}

/// Severity of a server-pushed notification (and of local toasts).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A notification pushed by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerNotification {
    pub id: String,
    #[serde(rename = "type")]
    pub level: NotificationLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// A parsed message from any of the subscribed topics.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Board(BoardEvent),
    Task(TaskEvent),
    Comment(CommentEvent),
}

impl Event {
    /// Parse a MESSAGE frame body according to the topic it arrived on.
    pub fn parse(topic: &Topic, body: &str) -> Result<Event, serde_json::Error> {
        match topic {
            Topic::UserBoards | Topic::Board(_) => Ok(Event::Board(serde_json::from_str(body)?)),
            Topic::Task(_) | Topic::BoardTasks(_) => Ok(Event::Task(serde_json::from_str(body)?)),
            Topic::TaskComments(_) => Ok(Event::Comment(serde_json::from_str(body)?)),
        }
    }
}
