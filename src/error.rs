use crate::agents::UpdateState;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UpdaterError {
    #[error("Usage error: {0}")]
    Usage(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Manifest error: {0}")]
    Manifest(String),

    #[error("Host error: HTTP {status} - {message}")]
    Host { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Update failed at {state}: {source}")]
    Failed {
        state: UpdateState,
        #[source]
        source: Box<UpdaterError>,
    },

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl UpdaterError {
    /// Tag the error with the orchestrator state it was raised from.
    ///
    /// Errors that already carry a state keep the original one.
    pub fn at(self, state: UpdateState) -> Self {
        match self {
            failed @ UpdaterError::Failed { .. } => failed,
            other => UpdaterError::Failed {
                state,
                source: Box::new(other),
            },
        }
    }

    /// The innermost error, skipping state wrappers.
    pub fn root(&self) -> &UpdaterError {
        match self {
            UpdaterError::Failed { source, .. } => source.root(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, UpdaterError>;
