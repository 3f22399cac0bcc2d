use serde::{Deserialize, Serialize};

/// A registered user.
///
/// The user listing endpoints return a reduced shape without `email`,
/// so the field is optional on the client side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Login request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Registration request body.
///
/// The backend does not accept an email at registration time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub password: String,
}

/// Response from `/auth/login` and `/auth/register`.
///
/// The backend returns the token only; the current user is fetched
/// separately via `GET /auth/me`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_without_email_deserializes() {
        let user: User = serde_json::from_str(r#"{"id":3,"username":"alice"}"#).unwrap();
        assert_eq!(user.id, 3);
        assert_eq!(user.username, "alice");
        assert_eq!(user.email, None);
    }

    #[test]
    fn auth_response_tolerates_missing_token() {
        // Some register responses carry no token; the session layer
        // treats an empty token as "no auto-login".
        let response: AuthResponse = serde_json::from_str("{}").unwrap();
        assert!(response.token.is_empty());
    }
}
