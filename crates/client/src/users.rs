//! User directory endpoints (for member pickers).

use models::user::User;

use crate::{error::ApiError, http::ApiClient};

#[derive(Debug, Clone)]
pub struct UserService {
    api: ApiClient,
}

impl UserService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// `GET /auth/users`.
    pub async fn list(&self) -> Result<Vec<User>, ApiError> {
        self.api.get("/auth/users").await
    }

    /// `GET /auth/users/search?query=`.
    pub async fn search(&self, query: &str) -> Result<Vec<User>, ApiError> {
        self.api
            .get(&format!(
                "/auth/users/search?query={}",
                urlencoding::encode(query)
            ))
            .await
    }
}
