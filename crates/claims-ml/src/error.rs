//! Error types for feature preparation and modeling.

use claims_model::DataError;
use claims_quality::QualityError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MlError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Imputation(#[from] QualityError),

    /// Train ratio outside (0, 1).
    #[error("train ratio must be in (0, 1), got {0}")]
    InvalidSplitRatio(f64),

    /// Not enough rows to form both splits.
    #[error("need at least 2 rows to split, got {rows}")]
    TooFewRows { rows: usize },

    /// Target column cannot serve the task.
    #[error("target '{column}' cannot be used: {reason}")]
    InvalidTarget { column: String, reason: String },

    #[error("no feature columns selected")]
    NoFeatures,

    /// Invalid pipeline setting.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Feature matrix and target disagree on row count.
    #[error("feature matrix has {rows} rows but target has {targets}")]
    RowMismatch { rows: usize, targets: usize },

    #[error("feature matrix is empty")]
    EmptyMatrix,

    /// Flat buffer does not match the declared shape.
    #[error("matrix shape {rows}x{cols} does not match {len} values")]
    Shape { rows: usize, cols: usize, len: usize },

    /// NaN or infinite value reached a model.
    #[error("non-finite value at row {row}, feature {feature}")]
    NonFinite { row: usize, feature: usize },
}

pub type Result<T> = std::result::Result<T, MlError>;
