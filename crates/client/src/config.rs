//! Client configuration.

/// Default API base URL for local development.
pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";

/// Where the backend lives.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL for REST calls, including the `/api` prefix.
    pub api_base_url: String,
    /// WebSocket endpoint. When unset it is derived from
    /// `api_base_url` (scheme switched to ws(s), path `/ws`).
    pub ws_url: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            ws_url: None,
        }
    }
}

impl ClientConfig {
    /// Read configuration from `TASKBOARD_API_URL` / `TASKBOARD_WS_URL`,
    /// falling back to the local-development defaults.
    pub fn from_env() -> Self {
        Self {
            api_base_url: std::env::var("TASKBOARD_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            ws_url: std::env::var("TASKBOARD_WS_URL").ok(),
        }
    }

    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            ws_url: None,
        }
    }

    pub fn with_ws_url(mut self, ws_url: impl Into<String>) -> Self {
        self.ws_url = Some(ws_url.into());
        self
    }
}
