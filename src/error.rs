use thiserror::Error;

/// Error taxonomy for every fallible operation in the crate.
///
/// Only one class is ever recovered automatically: a remote call rejected
/// with HTTP 401 triggers a single refresh-and-retry cycle. Everything else
/// is surfaced to the caller unchanged.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Bad or missing client configuration (file load, host syntax, shape).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Caller misuse: missing credentials, conflicting or incomplete job
    /// selectors, more than one job id.
    #[error("usage error: {0}")]
    Usage(String),

    /// Credentials or token refresh rejected by the remote service.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// A remote job reached a terminal failure state.
    #[error("job failed with status {name} ({date}): {message}")]
    JobFailed {
        name: String,
        date: String,
        message: String,
    },

    /// Any other collaborator failure. Transport-level errors carry no
    /// HTTP status.
    #[error("remote call failed: {message}")]
    RemoteCall {
        status: Option<u16>,
        message: String,
    },
}

impl ClientError {
    pub(crate) fn remote(status: Option<u16>, message: impl Into<String>) -> Self {
        ClientError::RemoteCall {
            status,
            message: message.into(),
        }
    }

    /// The distinguished condition the retry policy keys on.
    pub fn is_session_expired(&self) -> bool {
        matches!(
            self,
            ClientError::RemoteCall {
                status: Some(401),
                ..
            }
        )
    }

    /// HTTP status of the failed call, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::RemoteCall { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::RemoteCall {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
