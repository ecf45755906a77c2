//! Function error types

use thiserror::Error;

/// Errors raised while serving one invocation
#[derive(Debug, Error)]
pub enum ListingError {
    /// Requested path leaves the mount (`..`, absolute path, escaping symlink)
    #[error("path {0:?} is outside the file system")]
    OutsideMount(String),

    /// Requested path does not exist
    #[error("path {0:?} not found")]
    NotFound(String),

    /// Requested path exists but is not a directory
    #[error("path {0:?} is not a directory")]
    NotADirectory(String),

    /// Unexpected file-system failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invocation payload is not an API Gateway proxy event
    #[error("invalid event: {0}")]
    InvalidEvent(#[from] serde_json::Error),
}

impl ListingError {
    /// HTTP status for errors the caller caused; `None` for internal failures
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::OutsideMount(_) | Self::NotADirectory(_) => Some(400),
            Self::NotFound(_) => Some(404),
            Self::Io(_) | Self::InvalidEvent(_) => None,
        }
    }

    /// Value of `errorType` when reported to the Runtime API
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Io(_) => "Handler.Io",
            Self::InvalidEvent(_) => "Handler.InvalidEvent",
            _ => "Handler.Request",
        }
    }
}
