//! Error type returned at the client boundary.

use thiserror::Error;

/// Code used for transport and parse failures.
pub const TRANSPORT_ERROR: i64 = 0;

/// Code used for authentication failures.
pub const UNAUTHORIZED: i64 = 401;

/// A failed backend call.
///
/// `code` is the backend's business code, the HTTP status, or
/// [`TRANSPORT_ERROR`] when no usable response arrived.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("api error {code}: {message}")]
pub struct ApiError {
    pub code: i64,
    pub message: String,
}

impl ApiError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Network, timeout or decoding failure.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(TRANSPORT_ERROR, message)
    }

    /// The session could not be renewed and was cleared.
    pub fn session_expired() -> Self {
        Self::new(UNAUTHORIZED, "session expired")
    }

    pub fn is_unauthorized(&self) -> bool {
        self.code == UNAUTHORIZED
    }

    pub fn is_transport(&self) -> bool {
        self.code == TRANSPORT_ERROR
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::transport(format!("request timed out: {}", e))
        } else if e.is_connect() {
            ApiError::transport(format!("connection failed: {}", e))
        } else {
            ApiError::transport(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_and_codes() {
        let err = ApiError::new(4003, "quota exceeded");
        assert_eq!(err.to_string(), "api error 4003: quota exceeded");
        assert!(!err.is_unauthorized());

        assert!(ApiError::session_expired().is_unauthorized());
        assert!(ApiError::transport("boom").is_transport());
    }
}
