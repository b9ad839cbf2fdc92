//! Error types for model construction and solving.
//!
//! An unsolvable puzzle is not an error: the solver reports it through
//! [`SolveStatus::NoSolution`](crate::solver::SolveStatus). The variants here
//! cover malformed input only.

use thiserror::Error;

/// Errors raised while building or validating the crossword model.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The grid structure text could not be turned into a usable grid.
    #[error("invalid grid structure: {reason}")]
    Structure { reason: String },

    /// The model violates an internal invariant, e.g. a zero-length variable
    /// or an overlap index that falls outside a variable's length.
    #[error("invalid model: {reason}")]
    InvalidModel { reason: String },
}

impl ModelError {
    pub fn structure(reason: impl Into<String>) -> Self {
        ModelError::Structure {
            reason: reason.into(),
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        ModelError::InvalidModel {
            reason: reason.into(),
        }
    }
}
