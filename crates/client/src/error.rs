use thiserror::Error;

/// Errors from the REST layer.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The server rejected the token (HTTP 401). The session layer
    /// reacts with a forced logout.
    #[error("unauthorized")]
    Unauthorized,
    #[error("request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("server returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to parse response: {0}")]
    Parse(String),
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// Returns true if the error is transient and could be retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout | Self::Transport(_))
    }
}

pub(crate) fn map_reqwest_error(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::Timeout
    } else {
        ApiError::Transport(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_classification() {
        assert!(ApiError::Unauthorized.is_unauthorized());
        assert!(ApiError::Timeout.is_transient());
        assert!(ApiError::Transport("reset".to_string()).is_transient());
        assert!(!ApiError::Unauthorized.is_transient());
        assert!(
            !ApiError::Status {
                status: 500,
                body: String::new()
            }
            .is_transient()
        );
    }
}
