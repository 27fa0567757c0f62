use thiserror::Error;

use crate::network::Stage;

/// Errors raised while building the network or deriving its matrices
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Duplicate {kind} key: {key}")]
    DuplicateKey { kind: &'static str, key: String },

    #[error("Invalid {subject}: {}", .problems.join("; "))]
    Validation {
        subject: String,
        problems: Vec<String>,
    },

    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    #[error("Cannot {operation} before the {missing} stage has completed")]
    NotReady {
        operation: &'static str,
        missing: Stage,
    },

    #[error("Dimension mismatch: {context} (expected {expected}, got {actual})")]
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl NetworkError {
    pub fn validation(subject: impl Into<String>, problems: Vec<String>) -> Self {
        Self::Validation {
            subject: subject.into(),
            problems,
        }
    }

    /// Flatten field-level validation failures into one error for `subject`
    pub fn invalid_fields(subject: impl Into<String>, errors: &validator::ValidationErrors) -> Self {
        let mut problems: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(msg) => msg.to_string(),
                    None => format!("{field}: {}", e.code),
                })
            })
            .collect();
        problems.sort();
        Self::validation(subject, problems)
    }
}

/// Names of the fields whose value is NaN or infinite
pub(crate) fn non_finite_fields(fields: &[(&str, f64)]) -> Vec<String> {
    fields
        .iter()
        .filter(|(_, value)| !value.is_finite())
        .map(|(name, value)| format!("{name} must be a finite number, got {value}"))
        .collect()
}

pub type Result<T> = std::result::Result<T, NetworkError>;
