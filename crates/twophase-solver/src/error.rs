use thiserror::Error;

use crate::solution::SolutionStatus;

/// Failures that stop a solve before an optimality verdict is reached.
///
/// Infeasibility and unboundedness are regular outcomes and are reported
/// through [`SolutionStatus`], not through this type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolveError {
    #[error("Dimension mismatch in {context}: expected {expected}, found {found}")]
    InvalidDimension {
        context: String,
        expected: usize,
        found: usize,
    },
    #[error("Problem has no variables")]
    NoVariables,
    #[error("Numeric degeneracy: {0}")]
    NumericDegeneracy(String),
    #[error("Iteration limit of {0} exceeded")]
    MaxIterationsExceeded(usize),
}

impl SolveError {
    pub(crate) fn dimension(context: impl Into<String>, expected: usize, found: usize) -> Self {
        Self::InvalidDimension {
            context: context.into(),
            expected,
            found,
        }
    }

    pub(crate) fn degenerate(what: impl Into<String>) -> Self {
        Self::NumericDegeneracy(what.into())
    }

    /// The status code reported to callers for this failure.
    pub fn status(&self) -> SolutionStatus {
        match self {
            SolveError::InvalidDimension { .. } | SolveError::NoVariables => {
                SolutionStatus::InvalidDimension
            }
            SolveError::NumericDegeneracy(_) => SolutionStatus::NumericDegeneracy,
            SolveError::MaxIterationsExceeded(_) => SolutionStatus::MaxIterationsExceeded,
        }
    }
}
