//! Statement generation error types.

use forecast_shared::AppError;
use thiserror::Error;

/// Errors that can occur while generating a statement set.
///
/// Non-convergence is not an error: it is reported through
/// [`ConvergenceReport`](super::ConvergenceReport).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatementError {
    /// A driver or policy value is malformed.
    #[error("Invalid input for {field}{}: {reason}", year_suffix(.year))]
    InvalidInput {
        /// Zero-based year index, when the value belongs to a series.
        year: Option<usize>,
        /// Offending field.
        field: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Driver series of unequal length.
    #[error("Length mismatch for {field}: expected {expected} entries, got {actual}")]
    LengthMismatch {
        /// Offending series.
        field: String,
        /// Horizon length taken from `revenue`.
        expected: usize,
        /// Length of the offending series.
        actual: usize,
    },

    /// The horizon holds no years.
    #[error("Horizon must contain at least one year")]
    EmptyHorizon,

    /// Engine settings out of range.
    #[error("Invalid engine settings: {0}")]
    InvalidSettings(String),

    /// An amount left the representable decimal range.
    #[error("Amounts overflowed the decimal range in year {year}")]
    Overflow {
        /// Zero-based year index.
        year: usize,
    },

    /// A derived ratio would divide by zero.
    #[error("Division by zero computing {ratio} in year {year}")]
    DivisionByZero {
        /// Zero-based year index.
        year: usize,
        /// Ratio name.
        ratio: &'static str,
    },
}

#[allow(clippy::ref_option)]
fn year_suffix(year: &Option<usize>) -> String {
    year.map(|y| format!(" in year {y}")).unwrap_or_default()
}

impl StatementError {
    /// Creates an `InvalidInput` error for a value inside a series.
    pub(crate) fn invalid_at(year: usize, field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            year: Some(year),
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates an `InvalidInput` error for a scalar value.
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            year: None,
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<StatementError> for AppError {
    fn from(err: StatementError) -> Self {
        match err {
            StatementError::InvalidInput { .. }
            | StatementError::LengthMismatch { .. }
            | StatementError::EmptyHorizon => Self::Validation(err.to_string()),
            StatementError::InvalidSettings(_) => Self::Configuration(err.to_string()),
            StatementError::Overflow { .. } | StatementError::DivisionByZero { .. } => {
                Self::BusinessRule(err.to_string())
            }
        }
    }
}
