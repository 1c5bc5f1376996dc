use thiserror::Error;

use crate::column::ColumnKind;

/// Errors raised while building or querying a [`Dataset`](crate::Dataset).
#[derive(Debug, Error, PartialEq)]
pub enum DataError {
    /// Column lookup failed.
    #[error("column '{column}' not found in dataset")]
    ColumnNotFound { column: String },

    /// Two columns share a name.
    #[error("duplicate column '{column}'")]
    DuplicateColumn { column: String },

    /// A column does not have the dataset height.
    #[error("column '{column}' has {found} values, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },

    /// A column has the wrong kind for the requested operation.
    #[error("column '{column}' is {found}, expected {expected}")]
    KindMismatch {
        column: String,
        expected: ColumnKind,
        found: ColumnKind,
    },

    /// Row index outside the dataset.
    #[error("row {row} out of bounds for dataset of height {height}")]
    RowOutOfBounds { row: usize, height: usize },
}

pub type Result<T> = std::result::Result<T, DataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DataError::LengthMismatch {
            column: "TotalClaims".to_string(),
            expected: 10,
            found: 9,
        };
        assert_eq!(
            err.to_string(),
            "column 'TotalClaims' has 9 values, expected 10"
        );

        let err = DataError::KindMismatch {
            column: "Province".to_string(),
            expected: ColumnKind::Numeric,
            found: ColumnKind::Categorical,
        };
        assert_eq!(
            err.to_string(),
            "column 'Province' is categorical, expected numeric"
        );
    }
}
