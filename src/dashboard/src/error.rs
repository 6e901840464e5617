use std::borrow::Cow;

use thiserror::Error;

use crate::fetch::transport::TransportError;

/// Normalized fetch failure. Raw transport errors never cross the fetch
/// boundary; panels and the UI only ever see one of these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("request timed out after {attempts} attempt(s)")]
    Timeout { attempts: u32 },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("server error (HTTP {status})")]
    ServerError { status: u16 },

    /// Anything else. `status` is set for HTTP statuses outside 404 and 5xx.
    #[error("unknown error: {detail}")]
    Unknown { status: Option<u16>, detail: String },
}

impl FetchError {
    /// Normalize the last transport failure of a request to `path`.
    pub fn from_transport(error: TransportError, attempts: u32, path: &str) -> Self {
        match error {
            TransportError::Connect(msg) => FetchError::NetworkUnreachable(msg),
            TransportError::Timeout => FetchError::Timeout { attempts },
            TransportError::Status(404) => FetchError::NotFound(path.to_string()),
            TransportError::Status(status) if (500..600).contains(&status) => {
                FetchError::ServerError { status }
            }
            TransportError::Status(status) => FetchError::Unknown {
                status: Some(status),
                detail: format!("unexpected HTTP status {status} from {path}"),
            },
            TransportError::Other(detail) => FetchError::unknown(detail),
        }
    }

    /// Unclassified failure without an HTTP status.
    pub fn unknown(detail: impl Into<String>) -> Self {
        FetchError::Unknown {
            status: None,
            detail: detail.into(),
        }
    }

    /// Human-readable message shown in a panel in the `Error` state.
    pub fn user_message(&self) -> Cow<'static, str> {
        match self {
            FetchError::NetworkUnreachable(_) => {
                "Unable to connect to server. Please check your connection.".into()
            }
            FetchError::Timeout { .. } => "Request timed out. Please try again later.".into(),
            FetchError::NotFound(_) => "Requested data not found.".into(),
            FetchError::ServerError { .. } => "Server error. Please try again later.".into(),
            FetchError::Unknown {
                status: Some(status),
                ..
            } => format!("Error {status}: Request failed. Please try again later.").into(),
            FetchError::Unknown { status: None, .. } => {
                "Something went wrong. Please try again later.".into()
            }
        }
    }
}
