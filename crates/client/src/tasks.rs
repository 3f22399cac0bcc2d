//! Task endpoints, all scoped under a board.

use models::task::{CreateTask, Task, UpdateTask};

use crate::{error::ApiError, http::ApiClient};

#[derive(Debug, Clone)]
pub struct TaskService {
    api: ApiClient,
}

impl TaskService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// `GET /boards/{id}/tasks`.
    pub async fn list_for_board(&self, board_id: i64) -> Result<Vec<Task>, ApiError> {
        self.api.get(&format!("/boards/{board_id}/tasks")).await
    }

    /// `POST /boards/{id}/tasks`.
    pub async fn create(&self, board_id: i64, request: &CreateTask) -> Result<Task, ApiError> {
        self.api
            .post(&format!("/boards/{board_id}/tasks"), request)
            .await
    }

    /// `PUT /boards/{id}/tasks/{taskId}`.
    pub async fn update(
        &self,
        board_id: i64,
        task_id: i64,
        request: &UpdateTask,
    ) -> Result<Task, ApiError> {
        self.api
            .put(&format!("/boards/{board_id}/tasks/{task_id}"), request)
            .await
    }

    /// `DELETE /boards/{id}/tasks/{taskId}` — the server cascades
    /// comment deletion.
    pub async fn delete(&self, board_id: i64, task_id: i64) -> Result<(), ApiError> {
        self.api
            .delete(&format!("/boards/{board_id}/tasks/{task_id}"))
            .await
    }
}
