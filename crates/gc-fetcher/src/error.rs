use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no geocaching.com credentials available")]
    Credentials,

    #[error("login to geocaching.com failed")]
    Login,

    #[error("invalid url {0:?}")]
    InvalidUrl(String),

    #[error("{url} answered {status}")]
    Status { url: String, status: StatusCode },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether a later attempt of the same download may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Status { status, .. } => status.is_server_error(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
