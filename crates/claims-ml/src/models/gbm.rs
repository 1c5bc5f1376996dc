//! Gradient-boosted regression trees.
//!
//! Regression boosts squared error from the target mean. Binary
//! classification boosts log-loss from the prior log-odds; each tree is fitted
//! to the residuals `y - p` and its leaves are replaced with the Newton step
//! `sum(y - p) / sum(p (1 - p))`.

use claims_common::stats::mean;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::features::Task;
use crate::matrix::Matrix;

use super::tree::{DecisionTree, normalize};
use super::{ModelParams, Predictor};

const PROBABILITY_FLOOR: f64 = 1e-6;
const MIN_HESSIAN: f64 = 1e-12;

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

#[derive(Debug, Clone)]
pub struct GradientBoosting {
    task: Task,
    base_score: f64,
    learning_rate: f64,
    trees: Vec<DecisionTree>,
    n_features: usize,
}

impl GradientBoosting {
    pub fn fit(x: &Matrix, y: &[f64], task: Task, params: &ModelParams) -> Self {
        let n = x.n_rows();
        let prior = mean(y).unwrap_or(0.0);
        let base_score = match task {
            Task::Regression => prior,
            Task::Classification => {
                let p = prior.clamp(PROBABILITY_FLOOR, 1.0 - PROBABILITY_FLOOR);
                (p / (1.0 - p)).ln()
            }
        };
        let tree_params = params.tree_params(params.boosting_depth, None);
        let mut rng = ChaCha8Rng::seed_from_u64(params.seed);

        let mut raw = vec![base_score; n];
        let mut trees = Vec::with_capacity(params.boosting_rounds);
        for _ in 0..params.boosting_rounds {
            let (residuals, hessians): (Vec<f64>, Vec<f64>) = match task {
                Task::Regression => (y.iter().zip(&raw).map(|(t, f)| t - f).collect(), vec![1.0; n]),
                Task::Classification => raw
                    .iter()
                    .zip(y)
                    .map(|(f, t)| {
                        let p = sigmoid(*f);
                        (t - p, p * (1.0 - p))
                    })
                    .unzip(),
            };
            let mut tree =
                DecisionTree::fit_rows(x, &residuals, (0..n).collect(), &tree_params, &mut rng);

            if task == Task::Classification {
                let mut sums: Vec<(f64, f64)> = vec![(0.0, 0.0); tree.n_nodes()];
                for (i, row) in x.rows().enumerate() {
                    let leaf = tree.leaf_index(row);
                    sums[leaf].0 += residuals[i];
                    sums[leaf].1 += hessians[i];
                }
                for (leaf, (g, h)) in sums.into_iter().enumerate() {
                    if h > 0.0 {
                        tree.set_leaf_value(leaf, g / h.max(MIN_HESSIAN));
                    }
                }
            }

            for (f, row) in raw.iter_mut().zip(x.rows()) {
                *f += params.learning_rate * tree.predict_row(row);
            }
            trees.push(tree);
        }

        Self {
            task,
            base_score,
            learning_rate: params.learning_rate,
            trees,
            n_features: x.n_cols(),
        }
    }

    /// Additive score before the link function.
    pub fn raw_score(&self, row: &[f64]) -> f64 {
        self.base_score
            + self.learning_rate * self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>()
    }

    pub fn n_rounds(&self) -> usize {
        self.trees.len()
    }
}

impl Predictor for GradientBoosting {
    fn predict_row(&self, row: &[f64]) -> f64 {
        let raw = self.raw_score(row);
        match self.task {
            Task::Regression => raw,
            Task::Classification => sigmoid(raw),
        }
    }

    fn feature_importances(&self) -> Option<Vec<f64>> {
        let mut total = vec![0.0; self.n_features];
        for tree in &self.trees {
            for (acc, g) in total.iter_mut().zip(tree.gains()) {
                *acc += g;
            }
        }
        Some(normalize(&total))
    }
}
