use reqwest::StatusCode;
use thiserror::Error;

/// Failure while loading a translation resource.
///
/// These never reach the page: the asset layer logs them and substitutes an
/// empty mapping.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: StatusCode },

    #[error("{url} did not contain valid JSON: {source}")]
    Parse {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl AssetError {
    /// Transport errors, 429 and 5xx responses are worth another attempt.
    /// A 404 or a malformed file will not fix itself.
    pub fn is_retryable(&self) -> bool {
        match self {
            AssetError::Transport { .. } => true,
            AssetError::Status { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            AssetError::Parse { .. } => false,
        }
    }
}

/// Failure reading or writing the persisted language preference.
#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("failed to access preference file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("preference file {path} is corrupt: {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure building a document from a snapshot.
#[derive(Debug, Error)]
pub enum DomError {
    #[error("snapshot root must be an element, found a text node")]
    TextRoot,

    #[error("invalid snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),
}
