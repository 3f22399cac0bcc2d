//! Authentication endpoints.

use models::user::{AuthResponse, CreateUser, Credentials, User};

use crate::{error::ApiError, http::ApiClient};

#[derive(Debug, Clone)]
pub struct AuthService {
    api: ApiClient,
}

impl AuthService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// `POST /auth/login`. Returns the token only; fetch the user with
    /// [`me`](Self::me).
    pub async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ApiError> {
        self.api.post("/auth/login", credentials).await
    }

    /// `POST /auth/register`. The backend may or may not return a token.
    pub async fn register(&self, request: &CreateUser) -> Result<AuthResponse, ApiError> {
        self.api.post("/auth/register", request).await
    }

    /// `GET /auth/me` using the client's current token.
    pub async fn me(&self) -> Result<User, ApiError> {
        self.api.get("/auth/me").await
    }
}
