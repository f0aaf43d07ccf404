use thiserror::Error;

/// Rejection of a malformed sample before it reaches a cloud.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("sample field `{field}` must be finite, got {value}")]
    NonFinite { field: &'static str, value: f64 },

    #[error("batch sample {index}: field `{field}` must be finite, got {value}")]
    InBatch {
        index: usize,
        field: &'static str,
        value: f64,
    },
}

impl ValidationError {
    /// Attach the position of the offending sample within a batch.
    pub fn in_batch(self, index: usize) -> Self {
        match self {
            ValidationError::NonFinite { field, value } => ValidationError::InBatch {
                index,
                field,
                value,
            },
            other => other,
        }
    }
}
