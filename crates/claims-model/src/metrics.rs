//! Model evaluation results.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub mae: f64,
    pub mse: f64,
    pub rmse: f64,
    /// NaN when the actual values have zero variance.
    pub r2: f64,
}

/// Binary confusion matrix, positive class = `true`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_positive: usize,
    pub false_positive: usize,
    pub true_negative: usize,
    pub false_negative: usize,
}

impl ConfusionMatrix {
    pub fn total(&self) -> usize {
        self.true_positive + self.false_positive + self.true_negative + self.false_negative
    }
}

/// Precision, recall and F1 are NaN when undefined.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub confusion: ConfusionMatrix,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "task", rename_all = "snake_case")]
pub enum ModelMetrics {
    Regression(RegressionMetrics),
    Classification(ClassificationMetrics),
}

impl ModelMetrics {
    /// Value used to rank models: RMSE for regression (lower is better),
    /// negated F1 otherwise, so that smaller is always better.
    pub fn ranking_loss(&self) -> f64 {
        match self {
            Self::Regression(m) => m.rmse,
            Self::Classification(m) if m.f1.is_nan() => f64::INFINITY,
            Self::Classification(m) => -m.f1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

impl FeatureImportance {
    pub fn new(feature: impl Into<String>, importance: f64) -> Self {
        Self {
            feature: feature.into(),
            importance,
        }
    }
}

/// Sort importances descending; ties keep feature-name order.
pub fn rank_importances(importances: &mut [FeatureImportance]) {
    importances.sort_by(|a, b| {
        b.importance
            .total_cmp(&a.importance)
            .then_with(|| a.feature.cmp(&b.feature))
    });
}
