use claims_model::{ColumnKind, DataError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QualityError {
    #[error(transparent)]
    Data(#[from] DataError),

    /// Strategy cannot be applied to this column kind.
    #[error("cannot impute {kind} column '{column}' with {strategy}")]
    UnsupportedStrategy {
        column: String,
        kind: ColumnKind,
        strategy: &'static str,
    },

    /// Constant fill value does not parse as the column kind.
    #[error("invalid constant '{value}' for {kind} column '{column}'")]
    InvalidConstant {
        column: String,
        kind: ColumnKind,
        value: String,
    },
}

pub type Result<T> = std::result::Result<T, QualityError>;
