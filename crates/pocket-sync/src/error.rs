//! Error types for remote synchronization.

use pocket_core::error::PocketError;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Invalid sync endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("Request failed: {0}")]
    Request(String),
    #[error("Remote responded with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Sync aborted while {step}: {source}")]
    Step {
        step: String,
        #[source]
        source: Box<SyncError>,
    },
    #[error("Sync cancelled")]
    Cancelled,
    #[error("Storage error: {0}")]
    Storage(#[from] PocketError),
}

impl SyncError {
    /// Wrap a failure with the step it happened in. Cancellation passes
    /// through unwrapped.
    pub fn at(step: impl Into<String>) -> impl FnOnce(SyncError) -> SyncError {
        let step = step.into();
        move |err| match err {
            SyncError::Cancelled => SyncError::Cancelled,
            other => SyncError::Step {
                step,
                source: Box::new(other),
            },
        }
    }

    /// The name of the step that failed, if known.
    pub fn step(&self) -> Option<&str> {
        match self {
            SyncError::Step { step, .. } => Some(step),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        SyncError::Request(err.to_string())
    }
}

impl From<SyncError> for PocketError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Cancelled => PocketError::Cancelled,
            SyncError::InvalidEndpoint(msg) => PocketError::Validation(msg),
            other => PocketError::Sync(other.to_string()),
        }
    }
}
