use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InsightError {
    #[error("malformed model descriptor: {actual} actual values vs {predicted} predictions")]
    MalformedModelDescriptor { actual: usize, predicted: usize },

    #[error("the service returned no prediction")]
    EmptyPrediction,
}

pub type Result<T> = std::result::Result<T, InsightError>;
