use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Missing identity")]
    Unauthenticated,

    #[error("Signing not allowed: {0}")]
    SigningNotAllowed(String),

    #[error("Challenge failed: {0}")]
    ChallengeFailed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SyncError {
    /// Whether a retry on the next scheduled tick is likely to help.
    ///
    /// Network and gateway failures are transient; everything else needs a
    /// caller-side fix first (identity, configuration).
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SyncError::Http(_) | SyncError::Rpc(_) | SyncError::InvalidPayload(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
