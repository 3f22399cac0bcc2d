use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{comment::Comment, user::User};

/// Status columns of the Kanban view, in display order.
///
/// `Task::status` stays a free string on the wire; these are the columns
/// the board groups by.
pub const BOARD_COLUMNS: [&str; 4] = ["TODO", "IN_PROGRESS", "IN_REVIEW", "DONE"];

/// Task priority as accepted by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Urgent,
}

/// A task on a board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    pub board_id: i64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignees: Option<Vec<User>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<Comment>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Request body for `POST /boards/{id}/tasks`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTask {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_ids: Option<Vec<i64>>,
}

/// Request body for `PUT /boards/{id}/tasks/{taskId}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTask {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_ids: Option<Vec<i64>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_deserializes_with_camel_case_fields() {
        let json = r#"{
            "id": 12,
            "boardId": 5,
            "title": "Fix login",
            "status": "IN_PROGRESS",
            "priority": "HIGH",
            "assignees": [{"id": 2, "username": "bob"}]
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.board_id, 5);
        assert_eq!(task.status, "IN_PROGRESS");
        assert_eq!(task.priority, Some(TaskPriority::High));
    }

    #[test]
    fn create_task_omits_unset_fields() {
        let body = serde_json::to_string(&CreateTask {
            title: "New".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(body, r#"{"title":"New"}"#);
    }
}
