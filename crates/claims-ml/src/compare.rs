//! Train, evaluate and interpret several model kinds on one prepared split.

use std::time::Instant;

use claims_model::{FeatureImportance, ModelMetrics, rank_importances};
use serde::Serialize;
use tracing::{info, info_span};

use crate::error::Result;
use crate::evaluate::evaluate;
use crate::features::PreparedData;
use crate::interpret::{ImportanceConfig, ShapleyExplainer, permutation_importance};
use crate::models::{Model, ModelKind, ModelParams, Predictor, train};

/// Evaluation and interpretation of one fitted model.
#[derive(Debug, Clone, Serialize)]
pub struct ModelReport {
    pub model: ModelKind,
    /// Test-split metrics.
    pub metrics: ModelMetrics,
    pub train_metrics: ModelMetrics,
    /// Impurity importances; empty for linear models.
    pub impurity_importances: Vec<FeatureImportance>,
    pub permutation_importances: Vec<FeatureImportance>,
    /// Mean absolute Shapley attributions over the test split.
    pub shapley_importances: Vec<FeatureImportance>,
    pub duration_ms: u64,
}

/// Fit and score one model.
pub fn assess_model(
    kind: ModelKind,
    prepared: &PreparedData,
    params: &ModelParams,
    importance: &ImportanceConfig,
) -> Result<(Model, ModelReport)> {
    let _span = info_span!("assess_model", model = %kind).entered();
    let start = Instant::now();
    let names = prepared.feature_names();
    let model = train(kind, prepared.task, &prepared.x_train, &prepared.y_train, params)?;

    let metrics = evaluate(&model, prepared.task, &prepared.x_test, &prepared.y_test)?;
    let train_metrics = evaluate(&model, prepared.task, &prepared.x_train, &prepared.y_train)?;

    let mut impurity_importances: Vec<FeatureImportance> = model
        .feature_importances()
        .map(|values| {
            names
                .iter()
                .zip(values)
                .map(|(name, v)| FeatureImportance::new(name.clone(), v))
                .collect()
        })
        .unwrap_or_default();
    rank_importances(&mut impurity_importances);

    let permutation_importances =
        permutation_importance(&model, &prepared.x_test, &prepared.y_test, names, importance)?;
    let shapley_importances = if importance.shapley_rows > 0 {
        ShapleyExplainer::from_training(&model, &prepared.x_train, importance).mean_abs_attributions(
            &prepared.x_test,
            names,
            importance.shapley_rows,
        )?
    } else {
        Vec::new()
    };

    let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
    info!(
        loss = metrics.ranking_loss(),
        duration_ms, "model assessed"
    );
    let report = ModelReport {
        model: kind,
        metrics,
        train_metrics,
        impurity_importances,
        permutation_importances,
        shapley_importances,
        duration_ms,
    };
    Ok((model, report))
}

/// [`compare_models_with_progress`] without a progress callback.
pub fn compare_models(
    prepared: &PreparedData,
    kinds: &[ModelKind],
    params: &ModelParams,
    importance: &ImportanceConfig,
) -> Result<Vec<ModelReport>> {
    compare_models_with_progress(prepared, kinds, params, importance, |_| {})
}

/// Assess every kind in `kinds`, calling `on_done` after each, and return
/// the reports best first (lowest ranking loss; ties keep input order).
pub fn compare_models_with_progress(
    prepared: &PreparedData,
    kinds: &[ModelKind],
    params: &ModelParams,
    importance: &ImportanceConfig,
    mut on_done: impl FnMut(&ModelReport),
) -> Result<Vec<ModelReport>> {
    let start = Instant::now();
    let mut reports = Vec::with_capacity(kinds.len());
    for &kind in kinds {
        let (_, report) = assess_model(kind, prepared, params, importance)?;
        on_done(&report);
        reports.push(report);
    }
    reports.sort_by(|a, b| a.metrics.ranking_loss().total_cmp(&b.metrics.ranking_loss()));
    info!(
        models = reports.len(),
        best = reports.first().map(|r| r.model.as_str()),
        duration_ms = start.elapsed().as_millis(),
        "model comparison complete"
    );
    Ok(reports)
}
