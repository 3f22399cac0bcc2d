//! Comment endpoints, scoped under a task.

use models::comment::{Comment, CreateComment};

use crate::{error::ApiError, http::ApiClient};

#[derive(Debug, Clone)]
pub struct CommentService {
    api: ApiClient,
}

impl CommentService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// `GET /tasks/{id}/comments`.
    pub async fn list_for_task(&self, task_id: i64) -> Result<Vec<Comment>, ApiError> {
        self.api.get(&format!("/tasks/{task_id}/comments")).await
    }

    /// `POST /tasks/{id}/comments`.
    pub async fn create(&self, task_id: i64, request: &CreateComment) -> Result<Comment, ApiError> {
        self.api
            .post(&format!("/tasks/{task_id}/comments"), request)
            .await
    }
}
