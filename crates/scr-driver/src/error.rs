use thiserror::Error;

/// Failure to obtain or use a prediction provider.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictionError {
    #[error("Prediction provider unavailable: {0}")]
    Unavailable(String),

    #[error("Prediction failed: {0}")]
    Failed(String),

    #[error("Expected {expected} prediction outputs, got {actual}")]
    OutputArity { expected: usize, actual: usize },
}

pub type PredictionResult<T> = Result<T, PredictionError>;
