use thiserror::Error;

/// Failure reported by a [`crate::remote::RemoteStore`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("not authenticated")]
    Unauthorized,
    #[error("record not found")]
    NotFound,
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("remote store failure: {0}")]
    Remote(String),
}

/// Errors surfaced by the profile and piece controllers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("not authenticated")]
    AuthRequired,
    #[error("record not found")]
    NotFound,
    #[error("{0}")]
    Remote(String),
    #[error("failed to load {what}: {source}")]
    Fetch {
        what: &'static str,
        #[source]
        source: StoreError,
    },
    #[error("no profile loaded")]
    NoProfile,
    #[error("cannot move piece from index {from} to {to} in a collection of {len}")]
    InvalidMove { from: usize, to: usize, len: usize },
}

impl From<StoreError> for ClientError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Unauthorized => Self::AuthRequired,
            StoreError::NotFound => Self::NotFound,
            StoreError::Conflict(message) | StoreError::Remote(message) => Self::Remote(message),
        }
    }
}
