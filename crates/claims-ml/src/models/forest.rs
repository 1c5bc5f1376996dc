//! Random forest: bootstrap samples plus per-split feature subsampling.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::features::Task;
use crate::matrix::Matrix;

use super::tree::{DecisionTree, normalize};
use super::{ModelParams, Predictor};

#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_features: usize,
}

impl RandomForest {
    pub fn fit(x: &Matrix, y: &[f64], task: Task, params: &ModelParams) -> Self {
        let n = x.n_rows();
        let p = x.n_cols();
        let fraction = params.max_features.unwrap_or(match task {
            Task::Regression => 1.0 / 3.0,
            Task::Classification => (p as f64).sqrt() / p as f64,
        });
        let max_features = ((p as f64 * fraction).ceil() as usize).clamp(1, p);
        let tree_params = params.tree_params(params.max_depth, Some(max_features));

        let trees = (0..params.n_trees)
            .map(|t| {
                let mut rng = ChaCha8Rng::seed_from_u64(params.seed.wrapping_add(t as u64));
                let rows: Vec<usize> = (0..n).map(|_| rng.random_range(0..n)).collect();
                DecisionTree::fit_rows(x, y, rows, &tree_params, &mut rng)
            })
            .collect();
        Self { trees, n_features: p }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Predictor for RandomForest {
    fn predict_row(&self, row: &[f64]) -> f64 {
        let sum: f64 = self.trees.iter().map(|t| t.predict_row(row)).sum();
        sum / self.trees.len() as f64
    }

    /// Mean of the per-tree normalized importances.
    fn feature_importances(&self) -> Option<Vec<f64>> {
        let mut total = vec![0.0; self.n_features];
        for tree in &self.trees {
            for (acc, v) in total.iter_mut().zip(normalize(tree.gains())) {
                *acc += v;
            }
        }
        Some(normalize(&total))
    }
}
