//! Error types for claims data ingestion.

use std::path::PathBuf;

use claims_model::DataError;
use thiserror::Error;

/// Errors that can occur while loading or converting a claims extract.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// Input file not found.
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write file.
    #[error("failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === Parsing Errors ===
    /// Failed to parse CSV with Polars.
    #[error("failed to parse CSV {path}: {message}")]
    CsvParse { path: PathBuf, message: String },

    /// Failed to convert a delimited extract.
    #[error("failed to convert {path} at record {record}: {source}")]
    Convert {
        path: PathBuf,
        record: usize,
        #[source]
        source: csv::Error,
    },

    /// File has a header but no data rows.
    #[error("CSV file is empty: {path}")]
    EmptyCsv { path: PathBuf },

    /// A header cell is blank.
    #[error("empty column name in {path}")]
    EmptyColumnName { path: PathBuf },

    // === Schema Errors ===
    /// Required columns absent from the input.
    #[error("missing required columns in {path}: {}", columns.join(", "))]
    MissingColumns { path: PathBuf, columns: Vec<String> },

    /// Required columns present in the header but without a single value.
    #[error("required columns have no values in {path}: {}", columns.join(", "))]
    EmptyRequiredColumns { path: PathBuf, columns: Vec<String> },

    // === DataFrame Errors ===
    /// Failed DataFrame operation.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },

    /// Failed to assemble the typed dataset.
    #[error(transparent)]
    Data(#[from] DataError),
}

impl From<polars::prelude::PolarsError> for IngestError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IngestError::FileNotFound {
            path: PathBuf::from("/data/claims.csv"),
        };
        assert_eq!(err.to_string(), "file not found: /data/claims.csv");

        let err = IngestError::MissingColumns {
            path: PathBuf::from("claims.csv"),
            columns: vec!["Province".to_string(), "Gender".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "missing required columns in claims.csv: Province, Gender"
        );
    }

    #[test]
    fn test_error_from_polars() {
        let polars_err = polars::prelude::PolarsError::ColumnNotFound("TotalClaims".into());
        let ingest_err: IngestError = polars_err.into();
        assert!(matches!(ingest_err, IngestError::DataFrame { .. }));
    }
}
