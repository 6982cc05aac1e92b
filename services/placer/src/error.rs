//! Error types for the placer.

use pixfleet_canvas::CanvasError;
use thiserror::Error;

/// Placer errors.
#[derive(Debug, Error)]
pub enum PlacerError {
    /// Configuration is missing or inconsistent.
    #[error("configuration error: {0}")]
    Config(String),

    /// Color or coordinate could not be mapped onto the canvas.
    #[error(transparent)]
    Canvas(#[from] CanvasError),

    /// Token request failed or returned an unusable grant.
    #[error("token request for {username} failed: {message}")]
    Auth { username: String, message: String },

    /// Write endpoint answered with a non-2xx status.
    #[error("write rejected with HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Connection failure or timeout.
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response body matched neither known shape.
    #[error("unrecognized response: {0}")]
    Decode(String),

    /// Update feed could not be read.
    #[error("update feed error: {0}")]
    Feed(#[from] std::io::Error),

    /// Every account's most recent token request failed.
    #[error("no account in the pool can authenticate")]
    PoolExhausted,
}

impl PlacerError {
    /// Create an auth error for an account.
    pub fn auth(username: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Auth {
            username: username.into(),
            message: message.into(),
        }
    }

    /// Returns true if the write endpoint rejected the bearer token.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, PlacerError::Http { status: 401, .. })
    }

    /// Returns true if the whole run must stop.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PlacerError::Config(_) | PlacerError::Feed(_) | PlacerError::PoolExhausted
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_detection() {
        let err = PlacerError::Http {
            status: 401,
            body: String::new(),
        };
        assert!(err.is_unauthorized());
        assert!(!err.is_fatal());

        let err = PlacerError::Http {
            status: 500,
            body: String::new(),
        };
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn test_fatal_classification() {
        assert!(PlacerError::PoolExhausted.is_fatal());
        assert!(PlacerError::Config("no accounts".into()).is_fatal());
        assert!(!PlacerError::auth("alice", "bad password").is_fatal());
        assert!(!PlacerError::Decode("garbage".into()).is_fatal());
    }
}
