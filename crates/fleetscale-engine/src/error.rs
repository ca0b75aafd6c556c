//! Engine error types.

use thiserror::Error;

/// Errors that abort an autoscale cycle.
///
/// Insufficient metric data is not an error; it only skips the affected
/// action.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("rule set #{index}: addWhen fired but maxContainers is not defined")]
    MissingMaxContainers { index: usize },

    #[error("rule set #{index}: reduceWhen fired but minContainers is not defined")]
    MissingMinContainers { index: usize },

    #[error("remote call failed: {0}")]
    Remote(#[from] anyhow::Error),
}

impl EngineError {
    /// Whether the error stems from the rule configuration rather than the remote service.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            EngineError::MissingMaxContainers { .. } | EngineError::MissingMinContainers { .. }
        )
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
