use shared::error::BackendError;
use thiserror::Error;

/// Failure of a single call against the hosted backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The backend answered with a non-2xx status and an error body.
    #[error("backend rejected request ({status}): {error}")]
    Api { status: u16, error: BackendError },
    /// No response was received.
    #[error("backend request failed: {0}")]
    Transport(String),
    /// A response arrived but its body did not have the expected shape.
    #[error("unexpected backend payload: {0}")]
    Decode(String),
}

impl StoreError {
    /// Text suitable for inline display: the backend's own message when it
    /// sent one.
    pub fn message(&self) -> String {
        match self {
            StoreError::Api { error, .. } => error.message.clone(),
            StoreError::Transport(message) | StoreError::Decode(message) => message.clone(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            StoreError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(value: reqwest::Error) -> Self {
        StoreError::Transport(value.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        StoreError::Decode(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("failed to fetch user vehicle mappings: {0}")]
    LinkQueryFailed(StoreError),
    #[error("failed to fetch vehicles: {0}")]
    VehicleQueryFailed(StoreError),
}

/// Outcome of a failed vehicle submission. The `Display` text is what the
/// form shows inline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("User not authenticated. Please log in.")]
    Unauthenticated,
    #[error("Error adding vehicle: {0}")]
    VehicleInsertFailed(String),
    #[error("Error linking vehicle to user: {0}")]
    LinkInsertFailed(String),
    #[error("An unexpected error occurred.")]
    Unexpected(String),
}
