use claims_model::DataError;
use thiserror::Error;

/// Errors from segmentation and hypothesis testing.
#[derive(Debug, Error)]
pub enum StatsError {
    #[error(transparent)]
    Data(#[from] DataError),

    /// No record carries the requested label.
    #[error("group '{label}' of field '{field}' is empty")]
    EmptyGroup { field: String, label: String },

    /// Control and test labels must differ.
    #[error("control and test labels of field '{field}' are both '{label}'")]
    SameLabels { field: String, label: String },

    /// The field has fewer distinct values than needed.
    #[error("field '{field}' has {found} distinct values, need {needed}")]
    TooFewLabels {
        field: String,
        found: usize,
        needed: usize,
    },

    #[error("significance level must be in (0, 1), got {0}")]
    InvalidSignificance(f64),

    /// A distribution could not be built for the computed parameters.
    #[error("distribution error: {0}")]
    Distribution(String),
}

pub type Result<T> = std::result::Result<T, StatsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StatsError::EmptyGroup {
            field: "Province".to_string(),
            label: "Atlantis".to_string(),
        };
        assert_eq!(err.to_string(), "group 'Atlantis' of field 'Province' is empty");
    }
}
