//! Model families and the training entry point.
//!
//! Every fit owns its RNG, seeded from [`ModelParams::seed`], so training is
//! reproducible and fits share no state.

mod forest;
mod gbm;
mod linear;
mod tree;

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{MlError, Result};
use crate::features::Task;
use crate::matrix::Matrix;

pub use forest::RandomForest;
pub use gbm::GradientBoosting;
pub use linear::LinearModel;
pub use tree::{DecisionTree, TreeParams};

/// A fitted model. For classification tasks predictions are probabilities
/// of the positive class.
pub trait Predictor {
    fn predict_row(&self, row: &[f64]) -> f64;

    fn predict(&self, x: &Matrix) -> Vec<f64> {
        x.rows().map(|row| self.predict_row(row)).collect()
    }

    /// Impurity-based importances summing to one, for models that have them.
    fn feature_importances(&self) -> Option<Vec<f64>> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    LinearRegression,
    DecisionTree,
    RandomForest,
    GradientBoosting,
}

impl ModelKind {
    pub const ALL: [ModelKind; 4] = [
        Self::LinearRegression,
        Self::DecisionTree,
        Self::RandomForest,
        Self::GradientBoosting,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LinearRegression => "linear_regression",
            Self::DecisionTree => "decision_tree",
            Self::RandomForest => "random_forest",
            Self::GradientBoosting => "gradient_boosting",
        }
    }

    /// Parse a CLI/config name such as `random_forest` or `rf`.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().replace('-', "_").as_str() {
            "linear_regression" | "linear" | "ols" => Some(Self::LinearRegression),
            "decision_tree" | "tree" => Some(Self::DecisionTree),
            "random_forest" | "forest" | "rf" => Some(Self::RandomForest),
            "gradient_boosting" | "boosting" | "gbm" | "xgboost" => Some(Self::GradientBoosting),
            _ => None,
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hyper-parameters for every model family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParams {
    /// Depth limit for the decision tree and forest trees.
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub n_trees: usize,
    /// Fraction of features tried per forest split; defaults to 1/3 for
    /// regression and sqrt(p)/p for classification.
    pub max_features: Option<f64>,
    pub learning_rate: f64,
    pub boosting_rounds: usize,
    pub boosting_depth: usize,
    /// Ridge penalty on standardized linear coefficients.
    pub ridge: f64,
    pub seed: u64,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            max_depth: 12,
            min_samples_split: 2,
            min_samples_leaf: 1,
            n_trees: 100,
            max_features: None,
            learning_rate: 0.1,
            boosting_rounds: 100,
            boosting_depth: 3,
            ridge: 1e-8,
            seed: 42,
        }
    }
}

impl ModelParams {
    fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(MlError::InvalidConfig(msg.to_string()));
        if self.n_trees == 0 {
            return invalid("n_trees must be at least 1");
        }
        if self.boosting_rounds == 0 {
            return invalid("boosting_rounds must be at least 1");
        }
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return invalid("learning_rate must be in (0, 1]");
        }
        if let Some(fraction) = self.max_features
            && !(fraction > 0.0 && fraction <= 1.0)
        {
            return invalid("max_features must be in (0, 1]");
        }
        if !(self.ridge >= 0.0 && self.ridge.is_finite()) {
            return invalid("ridge must be a non-negative number");
        }
        Ok(())
    }

    pub(crate) fn tree_params(&self, max_depth: usize, max_features: Option<usize>) -> TreeParams {
        TreeParams {
            max_depth,
            min_samples_split: self.min_samples_split.max(2),
            min_samples_leaf: self.min_samples_leaf.max(1),
            max_features,
        }
    }
}

/// A fitted model of any family.
#[derive(Debug, Clone)]
pub enum Model {
    Linear(LinearModel),
    Tree(DecisionTree),
    Forest(RandomForest),
    Boosting(GradientBoosting),
}

impl Model {
    pub fn kind(&self) -> ModelKind {
        match self {
            Self::Linear(_) => ModelKind::LinearRegression,
            Self::Tree(_) => ModelKind::DecisionTree,
            Self::Forest(_) => ModelKind::RandomForest,
            Self::Boosting(_) => ModelKind::GradientBoosting,
        }
    }
}

impl Predictor for Model {
    fn predict_row(&self, row: &[f64]) -> f64 {
        match self {
            Self::Linear(m) => m.predict_row(row),
            Self::Tree(m) => m.predict_row(row),
            Self::Forest(m) => m.predict_row(row),
            Self::Boosting(m) => m.predict_row(row),
        }
    }

    fn feature_importances(&self) -> Option<Vec<f64>> {
        match self {
            Self::Linear(m) => m.feature_importances(),
            Self::Tree(m) => m.feature_importances(),
            Self::Forest(m) => m.feature_importances(),
            Self::Boosting(m) => m.feature_importances(),
        }
    }
}

/// Check that `x` and `y` can be fitted.
pub fn validate_training_data(x: &Matrix, y: &[f64]) -> Result<()> {
    if x.n_rows() != y.len() {
        return Err(MlError::RowMismatch {
            rows: x.n_rows(),
            targets: y.len(),
        });
    }
    if x.is_empty() {
        return Err(MlError::EmptyMatrix);
    }
    x.check_finite()?;
    if let Some(row) = y.iter().position(|v| !v.is_finite()) {
        return Err(MlError::InvalidTarget {
            column: "target".to_string(),
            reason: format!("non-finite value at row {row}"),
        });
    }
    Ok(())
}

/// Fit one model of `kind` on `x`/`y`.
pub fn train(kind: ModelKind, task: Task, x: &Matrix, y: &[f64], params: &ModelParams) -> Result<Model> {
    validate_training_data(x, y)?;
    params.validate()?;
    if task == Task::Classification && y.iter().any(|v| *v != 0.0 && *v != 1.0) {
        return Err(MlError::InvalidTarget {
            column: "target".to_string(),
            reason: "classification target must contain only 0 and 1".to_string(),
        });
    }

    let start = std::time::Instant::now();
    let model = match kind {
        ModelKind::LinearRegression => Model::Linear(LinearModel::fit(x, y, task, params.ridge)?),
        ModelKind::DecisionTree => {
            Model::Tree(DecisionTree::fit(x, y, &params.tree_params(params.max_depth, None), params.seed))
        }
        ModelKind::RandomForest => Model::Forest(RandomForest::fit(x, y, task, params)),
        ModelKind::GradientBoosting => Model::Boosting(GradientBoosting::fit(x, y, task, params)),
    };
    info!(
        model = %kind,
        rows = x.n_rows(),
        features = x.n_cols(),
        duration_ms = start.elapsed().as_millis(),
        "model trained"
    );
    Ok(model)
}
