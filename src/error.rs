use thiserror::Error;

/// Failures of the notification stream.
///
/// Only some of these are worth retrying: see [`StreamError::is_retryable`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    #[error("No access token available for the notification stream")]
    AuthUnavailable,

    #[error("Authentication failed: {status}")]
    AuthRejected { status: u16 },

    #[error("Unexpected HTTP status: {status}")]
    Http { status: u16 },

    #[error("Stream transport error: {0}")]
    Transport(String),

    #[error("Connection timeout")]
    Timeout,

    #[error("Connection closed unexpectedly")]
    ConnectionClosed,

    #[error("Maximum reconnection attempts ({attempts}) exceeded")]
    MaxReconnectsExceeded { attempts: u32 },
}

impl StreamError {
    /// Auth problems are configuration problems, not network faults.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StreamError::Http { .. }
                | StreamError::Transport(_)
                | StreamError::Timeout
                | StreamError::ConnectionClosed
        )
    }

    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            StreamError::AuthUnavailable | StreamError::AuthRejected { .. }
        )
    }
}

impl From<reqwest::Error> for StreamError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            StreamError::Timeout
        } else {
            StreamError::Transport(e.to_string())
        }
    }
}

/// Failures of the membership REST calls.
#[derive(Error, Debug)]
pub enum ClubsError {
    #[error("HTTP request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("URL parsing error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Not authenticated")]
    Unauthorized,

    #[error("{message}")]
    Api { status: u16, message: String },
}
