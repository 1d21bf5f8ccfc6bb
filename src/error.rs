//! Error types for drive operations

use thiserror::Error;

use crate::validate::ValidationError;

/// Result type alias for drive operations
pub type DriveResult<T> = std::result::Result<T, DriveError>;

/// Errors surfaced by drive operations
///
/// Every failure propagates to the immediate caller; nothing is retried and
/// nothing degrades to a default value. Status-code semantics of the remote
/// API are not guaranteed precise, so server failures stay a single generic
/// kind carrying the raw status and body for the caller to inspect.
#[derive(Error, Debug)]
pub enum DriveError {
    /// The connection settings carry no base URL. Raised before any
    /// request is made.
    #[error("remote server base URL is not set")]
    MissingBaseUrl,

    /// The server answered with a status the operation does not expect
    #[error("server returned {status} for {url}: {body}")]
    Server {
        status: u16,
        url: String,
        body: String,
    },

    /// The request could not complete (connect, send or receive failure)
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// A successful-status response body failed shape validation
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl DriveError {
    /// HTTP status of a server rejection, if that is what this error is
    pub fn status(&self) -> Option<u16> {
        match self {
            DriveError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_server_error(&self) -> bool {
        matches!(self, DriveError::Server { .. })
    }

    pub fn is_validation_error(&self) -> bool {
        matches!(self, DriveError::Validation(_))
    }
}
