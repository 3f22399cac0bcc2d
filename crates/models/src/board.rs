use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{task::Task, user::User};

/// A task board with its owner, members and (optionally embedded) tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub id: i64,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub members: Option<Vec<User>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Vec<Task>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Request body for `POST /boards`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBoard {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Request body for `PUT /boards/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBoard {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Request body for `POST /boards/{id}/members`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMember {
    pub user_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn board_deserializes_from_backend_shape() {
        let json = r#"{
            "id": 5,
            "title": "Sprint 12",
            "owner": {"id": 1, "username": "alice", "email": "a@example.com"},
            "members": [{"id": 2, "username": "bob"}],
            "createdAt": "2024-03-01T09:30:00Z"
        }"#;
        let board: Board = serde_json::from_str(json).unwrap();
        assert_eq!(board.id, 5);
        assert_eq!(board.owner.as_ref().unwrap().username, "alice");
        assert_eq!(board.members.as_ref().unwrap().len(), 1);
        assert!(board.tasks.is_none());
        assert!(board.created_at.is_some());
    }

    #[test]
    fn add_member_uses_camel_case() {
        let body = serde_json::to_string(&AddMember { user_id: 7 }).unwrap();
        assert_eq!(body, r#"{"userId":7}"#);
    }
}
