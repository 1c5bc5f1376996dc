//! Regression and classification metrics.

use claims_common::stats::mean;
use claims_model::{ClassificationMetrics, ConfusionMatrix, ModelMetrics, RegressionMetrics};

use crate::error::{MlError, Result};
use crate::features::Task;
use crate::matrix::Matrix;
use crate::models::Predictor;

/// Probability at or above which a prediction counts as positive.
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// MAE, MSE, RMSE and R². R² is NaN when `actual` has zero variance.
pub fn regression_metrics(actual: &[f64], predicted: &[f64]) -> RegressionMetrics {
    let n = actual.len() as f64;
    let (abs, sq) = actual
        .iter()
        .zip(predicted)
        .fold((0.0, 0.0), |(abs, sq), (a, p)| (abs + (a - p).abs(), sq + (a - p).powi(2)));
    let centre = mean(actual).unwrap_or(f64::NAN);
    let ss_tot: f64 = actual.iter().map(|a| (a - centre).powi(2)).sum();
    let mse = sq / n;
    RegressionMetrics {
        mae: abs / n,
        mse,
        rmse: mse.sqrt(),
        r2: if ss_tot > 0.0 { 1.0 - sq / ss_tot } else { f64::NAN },
    }
}

pub fn confusion_matrix(actual: &[f64], scores: &[f64], threshold: f64) -> ConfusionMatrix {
    let mut cm = ConfusionMatrix::default();
    for (a, s) in actual.iter().zip(scores) {
        match (*a >= 0.5, *s >= threshold) {
            (true, true) => cm.true_positive += 1,
            (false, true) => cm.false_positive += 1,
            (false, false) => cm.true_negative += 1,
            (true, false) => cm.false_negative += 1,
        }
    }
    cm
}

/// Accuracy, precision, recall and F1 at `threshold`. Precision is NaN with
/// no predicted positives, recall with no actual positives; F1 is NaN when
/// either is.
pub fn classification_metrics(actual: &[f64], scores: &[f64], threshold: f64) -> ClassificationMetrics {
    let cm = confusion_matrix(actual, scores, threshold);
    let ratio = |num: usize, den: usize| {
        if den == 0 {
            f64::NAN
        } else {
            num as f64 / den as f64
        }
    };
    let precision = ratio(cm.true_positive, cm.true_positive + cm.false_positive);
    let recall = ratio(cm.true_positive, cm.true_positive + cm.false_negative);
    let f1 = if precision.is_nan() || recall.is_nan() {
        f64::NAN
    } else {
        ratio(
            2 * cm.true_positive,
            2 * cm.true_positive + cm.false_positive + cm.false_negative,
        )
    };
    ClassificationMetrics {
        accuracy: ratio(cm.true_positive + cm.true_negative, cm.total()),
        precision,
        recall,
        f1,
        confusion: cm,
    }
}

/// Score `model` on `x`/`y` with the metrics of `task`.
pub fn evaluate<P: Predictor + ?Sized>(model: &P, task: Task, x: &Matrix, y: &[f64]) -> Result<ModelMetrics> {
    if x.n_rows() != y.len() {
        return Err(MlError::RowMismatch {
            rows: x.n_rows(),
            targets: y.len(),
        });
    }
    if y.is_empty() {
        return Err(MlError::EmptyMatrix);
    }
    let predictions = model.predict(x);
    Ok(match task {
        Task::Regression => ModelMetrics::Regression(regression_metrics(y, &predictions)),
        Task::Classification => ModelMetrics::Classification(classification_metrics(
            y,
            &predictions,
            DEFAULT_THRESHOLD,
        )),
    })
}
