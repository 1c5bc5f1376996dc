//! Claims prediction: feature pipeline, model training, evaluation and
//! interpretation.
//!
//! Typical flow:
//!
//! 1. [`prepare_features`] turns a cleaned [`claims_model::Dataset`] into
//!    train/test matrices with a [`FittedEncoder`]
//! 2. [`train`] fits a [`Model`] of a given [`ModelKind`]
//! 3. [`evaluate`] scores it, [`permutation_importance`] and
//!    [`ShapleyExplainer`] interpret it
//! 4. [`compare_models`] runs 2 and 3 for several kinds and ranks them

mod compare;
mod error;
pub mod evaluate;
pub mod features;
pub mod interpret;
mod matrix;
pub mod models;
mod split;

pub use compare::{ModelReport, assess_model, compare_models, compare_models_with_progress};
pub use error::{MlError, Result};
pub use evaluate::{DEFAULT_THRESHOLD, classification_metrics, evaluate, regression_metrics};
pub use features::{
    Encoding, FeatureConfig, FeatureEncoder, FittedEncoder, PreparedData, Task, UNKNOWN_CATEGORY,
    add_premium_ratio, prepare_features,
};
pub use interpret::{Attribution, ImportanceConfig, ShapleyExplainer, permutation_importance};
pub use matrix::Matrix;
pub use models::{Model, ModelKind, ModelParams, Predictor, train};
pub use split::{Split, train_test_split};
