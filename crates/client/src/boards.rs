//! Board and board-membership endpoints.

use models::board::{AddMember, Board, CreateBoard, UpdateBoard};

use crate::{error::ApiError, http::ApiClient};

#[derive(Debug, Clone)]
pub struct BoardService {
    api: ApiClient,
}

impl BoardService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// `GET /boards` — every board the user owns or is a member of.
    pub async fn list(&self) -> Result<Vec<Board>, ApiError> {
        self.api.get("/boards").await
    }

    /// `POST /boards`.
    pub async fn create(&self, request: &CreateBoard) -> Result<Board, ApiError> {
        self.api.post("/boards", request).await
    }

    /// `PUT /boards/{id}`.
    pub async fn update(&self, board_id: i64, request: &UpdateBoard) -> Result<Board, ApiError> {
        self.api.put(&format!("/boards/{board_id}"), request).await
    }

    /// `DELETE /boards/{id}` — the server cascades task deletion.
    pub async fn delete(&self, board_id: i64) -> Result<(), ApiError> {
        self.api.delete(&format!("/boards/{board_id}")).await
    }

    /// `POST /boards/{id}/members`. Returns the updated board.
    pub async fn add_member(&self, board_id: i64, request: &AddMember) -> Result<Board, ApiError> {
        self.api
            .post(&format!("/boards/{board_id}/members"), request)
            .await
    }

    /// `DELETE /boards/{id}/members/{memberId}`. Returns the updated
    /// board.
    pub async fn remove_member(&self, board_id: i64, member_id: i64) -> Result<Board, ApiError> {
        self.api
            .delete_json(&format!("/boards/{board_id}/members/{member_id}"))
            .await
    }
}
