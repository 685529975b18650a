use thiserror::Error;

/// Failure class of a remote or local operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Validation,
    NotFound,
    Unknown,
    Config,
    Lock,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Request failed: {0}")]
    Unknown(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Lock error: {0}")]
    Lock(String),
}

pub type Result<T> = std::result::Result<T, SyncError>;

impl SyncError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) => ErrorKind::Network,
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Unknown(_) => ErrorKind::Unknown,
            Self::Config(_) => ErrorKind::Config,
            Self::Lock(_) => ErrorKind::Lock,
        }
    }

    /// Maps a non-success HTTP status plus the server's message onto the taxonomy.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            404 => Self::NotFound(message),
            400 | 409 | 422 => Self::Validation(message),
            _ => Self::Unknown(format!("status {status}: {message}")),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for SyncError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::Lock(err.to_string())
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() || err.is_body() {
            return Self::Unknown(err.to_string());
        }
        if let Some(status) = err.status() {
            return Self::from_status(status.as_u16(), err.to_string());
        }
        Self::Network(err.to_string())
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        Self::Unknown(format!("malformed payload: {err}"))
    }
}

impl From<url::ParseError> for SyncError {
    fn from(err: url::ParseError) -> Self {
        Self::Config(format!("invalid url: {err}"))
    }
}
