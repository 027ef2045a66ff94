use artifacts::ArtifactError;
use thiserror::Error;

use crate::Stage;

#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The requested move is not legal for the current artifacts.
    #[error("cannot enter {stage}: {reason}")]
    InvalidTransition { stage: Stage, reason: &'static str },

    /// The service handed back a model that contradicts its own dataset.
    #[error("malformed model descriptor: {0}")]
    MalformedModelDescriptor(#[from] ArtifactError),

    #[error("unknown stage: {0}")]
    UnknownStage(String),
}

impl WorkflowError {
    /// Integration faults rather than ordinary user-facing failures.
    pub fn is_contract_breach(&self) -> bool {
        matches!(
            self,
            WorkflowError::InvalidTransition { .. } | WorkflowError::MalformedModelDescriptor(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, WorkflowError>;
