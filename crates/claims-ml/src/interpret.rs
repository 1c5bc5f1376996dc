//! Model-agnostic interpretation: permutation importance and sampled
//! Shapley attributions.

use claims_model::{FeatureImportance, rank_importances};
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::error::{MlError, Result};
use crate::matrix::Matrix;
use crate::models::Predictor;

/// Settings for [`permutation_importance`] and [`ShapleyExplainer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportanceConfig {
    pub n_repeats: usize,
    /// Sampled feature orderings per explained row.
    pub shapley_permutations: usize,
    /// Test rows explained for the global Shapley ranking.
    pub shapley_rows: usize,
    pub seed: u64,
}

impl Default for ImportanceConfig {
    fn default() -> Self {
        Self {
            n_repeats: 5,
            shapley_permutations: 50,
            shapley_rows: 100,
            seed: 42,
        }
    }
}

/// Mean squared error; on probabilities this is the Brier score.
fn loss(actual: &[f64], predicted: &[f64]) -> f64 {
    let n = actual.len() as f64;
    actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / n
}

/// Mean increase in squared error (Brier score for classifiers) when each
/// feature column is shuffled, averaged over `n_repeats` seeded shuffles.
/// Returned ranked, largest first.
pub fn permutation_importance<P: Predictor + ?Sized>(
    model: &P,
    x: &Matrix,
    y: &[f64],
    feature_names: &[String],
    config: &ImportanceConfig,
) -> Result<Vec<FeatureImportance>> {
    if x.n_rows() != y.len() {
        return Err(MlError::RowMismatch {
            rows: x.n_rows(),
            targets: y.len(),
        });
    }
    if x.is_empty() {
        return Err(MlError::EmptyMatrix);
    }
    if feature_names.len() != x.n_cols() {
        return Err(MlError::InvalidConfig(format!(
            "{} feature names for {} columns",
            feature_names.len(),
            x.n_cols()
        )));
    }
    let repeats = config.n_repeats.max(1);
    let base_loss = loss(y, &model.predict(x));
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut order: Vec<usize> = (0..x.n_rows()).collect();

    let mut importances = Vec::with_capacity(x.n_cols());
    for (j, name) in feature_names.iter().enumerate() {
        let original = x.column(j);
        let mut shuffled = x.clone();
        let mut increase = 0.0;
        for _ in 0..repeats {
            order.shuffle(&mut rng);
            for (i, &src) in order.iter().enumerate() {
                shuffled.set(i, j, original[src]);
            }
            increase += loss(y, &model.predict(&shuffled)) - base_loss;
        }
        importances.push(FeatureImportance::new(name.clone(), increase / repeats as f64));
    }
    rank_importances(&mut importances);
    Ok(importances)
}

/// Per-feature contributions for one row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribution {
    pub prediction: f64,
    pub baseline_prediction: f64,
    pub contributions: Vec<f64>,
}

impl Attribution {
    /// `prediction - baseline_prediction - sum(contributions)`; zero up to
    /// rounding.
    pub fn efficiency_gap(&self) -> f64 {
        self.prediction - self.baseline_prediction - self.contributions.iter().sum::<f64>()
    }
}

/// Shapley values estimated from sampled feature orderings. Features absent
/// from a coalition take their baseline value.
pub struct ShapleyExplainer<'a, P: Predictor + ?Sized> {
    model: &'a P,
    baseline: Vec<f64>,
    permutations: usize,
    seed: u64,
}

impl<'a, P: Predictor + ?Sized> ShapleyExplainer<'a, P> {
    pub fn new(model: &'a P, baseline: Vec<f64>, permutations: usize, seed: u64) -> Self {
        Self {
            model,
            baseline,
            permutations: permutations.max(1),
            seed,
        }
    }

    /// Explainer with the training column means as baseline.
    pub fn from_training(model: &'a P, x_train: &Matrix, config: &ImportanceConfig) -> Self {
        Self::new(model, x_train.column_means(), config.shapley_permutations, config.seed)
    }

    pub fn baseline(&self) -> &[f64] {
        &self.baseline
    }

    pub fn baseline_prediction(&self) -> f64 {
        self.model.predict_row(&self.baseline)
    }

    /// Attribute `row`'s prediction. Each sampled ordering adds features one
    /// at a time and credits each with the change in prediction, so the
    /// contributions of every ordering telescope to
    /// `prediction - baseline_prediction`.
    pub fn explain(&self, row: &[f64]) -> Result<Attribution> {
        let p = self.baseline.len();
        if row.len() != p {
            return Err(MlError::InvalidConfig(format!(
                "row has {} features, baseline has {p}",
                row.len()
            )));
        }
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut order: Vec<usize> = (0..p).collect();
        let mut contributions = vec![0.0; p];
        let baseline_prediction = self.baseline_prediction();
        let mut coalition = self.baseline.clone();

        for _ in 0..self.permutations {
            order.shuffle(&mut rng);
            coalition.copy_from_slice(&self.baseline);
            let mut previous = baseline_prediction;
            for &j in &order {
                coalition[j] = row[j];
                let current = self.model.predict_row(&coalition);
                contributions[j] += current - previous;
                previous = current;
            }
        }
        let scale = self.permutations as f64;
        contributions.iter_mut().for_each(|c| *c /= scale);
        Ok(Attribution {
            prediction: self.model.predict_row(row),
            baseline_prediction,
            contributions,
        })
    }

    /// Global ranking by mean absolute contribution over the first
    /// `max_rows` rows of `x`.
    pub fn mean_abs_attributions(
        &self,
        x: &Matrix,
        feature_names: &[String],
        max_rows: usize,
    ) -> Result<Vec<FeatureImportance>> {
        let rows = x.n_rows().min(max_rows);
        if rows == 0 {
            return Err(MlError::EmptyMatrix);
        }
        let mut totals = vec![0.0; self.baseline.len()];
        for i in 0..rows {
            let attribution = self.explain(x.row(i))?;
            for (t, c) in totals.iter_mut().zip(&attribution.contributions) {
                *t += c.abs();
            }
        }
        let mut ranked: Vec<FeatureImportance> = feature_names
            .iter()
            .zip(totals)
            .map(|(name, total)| FeatureImportance::new(name.clone(), total / rows as f64))
            .collect();
        rank_importances(&mut ranked);
        Ok(ranked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `f(x) = 3 x0 + x0 * x1` with an ignored third feature.
    struct Interaction;

    impl Predictor for Interaction {
        fn predict_row(&self, row: &[f64]) -> f64 {
            3.0 * row[0] + row[0] * row[1]
        }
    }

    fn names() -> Vec<String> {
        vec!["a".to_string(), "b".to_string(), "noise".to_string()]
    }

    fn data() -> (Matrix, Vec<f64>) {
        let rows: Vec<Vec<f64>> = (0..30)
            .map(|i| vec![f64::from(i % 7), f64::from(i % 3), f64::from(i % 5)])
            .collect();
        let x = Matrix::from_rows(&rows).unwrap();
        let y = Interaction.predict(&x);
        (x, y)
    }

    #[test]
    fn permutation_ranks_used_features_first() {
        let (x, y) = data();
        let ranked =
            permutation_importance(&Interaction, &x, &y, &names(), &ImportanceConfig::default())
                .unwrap();
        assert_eq!(ranked[0].feature, "a");
        assert_eq!(ranked[2].feature, "noise");
        assert_eq!(ranked[2].importance, 0.0);
    }

    #[test]
    fn permutation_ranking_is_stable_under_seed() {
        let (x, y) = data();
        let config = ImportanceConfig::default();
        let first = permutation_importance(&Interaction, &x, &y, &names(), &config).unwrap();
        let second = permutation_importance(&Interaction, &x, &y, &names(), &config).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn shapley_contributions_sum_to_prediction_gap() {
        let (x, _) = data();
        let explainer = ShapleyExplainer::from_training(&Interaction, &x, &ImportanceConfig::default());
        for i in 0..x.n_rows() {
            let attribution = explainer.explain(x.row(i)).unwrap();
            assert!(attribution.efficiency_gap().abs() < 1e-9);
            assert_eq!(attribution.contributions[2], 0.0);
        }
    }

    #[test]
    fn shapley_is_exact_for_additive_models() {
        struct Additive;
        impl Predictor for Additive {
            fn predict_row(&self, row: &[f64]) -> f64 {
                2.0 * row[0] - row[1]
            }
        }
        let explainer = ShapleyExplainer::new(&Additive, vec![1.0, 1.0], 3, 7);
        let attribution = explainer.explain(&[4.0, 3.0]).unwrap();
        assert!((attribution.contributions[0] - 6.0).abs() < 1e-12);
        assert!((attribution.contributions[1] + 2.0).abs() < 1e-12);
        assert!(explainer.explain(&[1.0]).is_err());
    }

    #[test]
    fn global_ranking_uses_mean_absolute_values() {
        let (x, _) = data();
        let explainer = ShapleyExplainer::from_training(&Interaction, &x, &ImportanceConfig::default());
        let ranked = explainer.mean_abs_attributions(&x, &names(), 10).unwrap();
        assert_eq!(ranked[0].feature, "a");
        assert_eq!(ranked.last().unwrap().feature, "noise");
    }
}
