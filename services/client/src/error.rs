use std::path::PathBuf;

use insights::InsightError;
use thiserror::Error;
use workflow::WorkflowError;

/// Failures talking to the training service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Non-2xx answer. `message` is the service's `error` field, or the
    /// operation's fallback text when the body carried none.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response from training service: {0}")]
    Decode(String),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("{0}")]
    Upload(String),

    #[error("{0}")]
    Training(String),

    #[error("{0}")]
    Prediction(String),

    #[error("training service unavailable: {0}")]
    Unavailable(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error(transparent)]
    Insight(#[from] InsightError),
}

impl SessionError {
    /// Faults in the client/service contract, as opposed to failures the
    /// user can fix by changing input.
    pub fn is_contract_breach(&self) -> bool {
        match self {
            SessionError::Workflow(e) => e.is_contract_breach(),
            SessionError::Insight(InsightError::MalformedModelDescriptor { .. }) => true,
            _ => false,
        }
    }
}
