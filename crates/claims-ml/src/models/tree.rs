//! CART regression tree (squared error) stored as a flat node list.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::matrix::Matrix;

use super::Predictor;

/// Minimum squared-error reduction for a split to be kept.
const MIN_GAIN: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features tried per split; all when `None`.
    pub max_features: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
struct Node {
    /// `None` for leaves.
    split: Option<Split>,
    value: f64,
    samples: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Split {
    feature: usize,
    threshold: f64,
    left: usize,
    right: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    /// Total squared-error reduction per feature.
    gains: Vec<f64>,
}

impl DecisionTree {
    /// Fit on every row of `x`.
    pub fn fit(x: &Matrix, y: &[f64], params: &TreeParams, seed: u64) -> Self {
        let rows: Vec<usize> = (0..x.n_rows()).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        Self::fit_rows(x, y, rows, params, &mut rng)
    }

    /// Fit on the given rows (repeats allowed, as in a bootstrap sample).
    pub(crate) fn fit_rows<R: Rng + ?Sized>(
        x: &Matrix,
        y: &[f64],
        rows: Vec<usize>,
        params: &TreeParams,
        rng: &mut R,
    ) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            gains: vec![0.0; x.n_cols()],
        };
        tree.grow(x, y, rows, 0, params, rng);
        tree
    }

    fn grow<R: Rng + ?Sized>(
        &mut self,
        x: &Matrix,
        y: &[f64],
        rows: Vec<usize>,
        depth: usize,
        params: &TreeParams,
        rng: &mut R,
    ) -> usize {
        let index = self.nodes.len();
        let sum: f64 = rows.iter().map(|&r| y[r]).sum();
        self.nodes.push(Node {
            split: None,
            value: if rows.is_empty() { 0.0 } else { sum / rows.len() as f64 },
            samples: rows.len(),
        });
        if depth >= params.max_depth || rows.len() < params.min_samples_split {
            return index;
        }
        let Some(best) = best_split(x, y, &rows, params, rng) else {
            return index;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .into_iter()
            .partition(|&r| x.get(r, best.feature) <= best.threshold);
        self.gains[best.feature] += best.gain;
        let left = self.grow(x, y, left_rows, depth + 1, params, rng);
        let right = self.grow(x, y, right_rows, depth + 1, params, rng);
        self.nodes[index].split = Some(Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        });
        index
    }

    /// Index of the leaf that `row` falls into.
    pub(crate) fn leaf_index(&self, row: &[f64]) -> usize {
        let mut index = 0;
        while let Some(split) = self.nodes[index].split {
            index = if row[split.feature] <= split.threshold {
                split.left
            } else {
                split.right
            };
        }
        index
    }

    /// Overwrite the output of a leaf.
    pub(crate) fn set_leaf_value(&mut self, leaf: usize, value: f64) {
        self.nodes[leaf].value = value;
    }

    pub(crate) fn gains(&self) -> &[f64] {
        &self.gains
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.split.is_none()).count()
    }

    /// Training rows at the root.
    pub fn samples(&self) -> usize {
        self.nodes.first().map_or(0, |n| n.samples)
    }
}

impl Predictor for DecisionTree {
    fn predict_row(&self, row: &[f64]) -> f64 {
        self.nodes[self.leaf_index(row)].value
    }

    fn feature_importances(&self) -> Option<Vec<f64>> {
        Some(normalize(&self.gains))
    }
}

/// Scale to sum one; all zeros stay zeros.
pub(crate) fn normalize(gains: &[f64]) -> Vec<f64> {
    let total: f64 = gains.iter().sum();
    if total > 0.0 {
        gains.iter().map(|g| g / total).collect()
    } else {
        vec![0.0; gains.len()]
    }
}

struct Candidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

fn best_split<R: Rng + ?Sized>(
    x: &Matrix,
    y: &[f64],
    rows: &[usize],
    params: &TreeParams,
    rng: &mut R,
) -> Option<Candidate> {
    let n_features = x.n_cols();
    let features: Vec<usize> = match params.max_features {
        Some(k) if k < n_features => {
            let mut picked = rand::seq::index::sample(rng, n_features, k.max(1)).into_vec();
            picked.sort_unstable();
            picked
        }
        _ => (0..n_features).collect(),
    };

    let n = rows.len() as f64;
    let total: f64 = rows.iter().map(|&r| y[r]).sum();
    let parent_score = total * total / n;
    let min_leaf = params.min_samples_leaf;

    let mut best: Option<Candidate> = None;
    let mut order: Vec<(f64, f64)> = Vec::with_capacity(rows.len());
    for feature in features {
        order.clear();
        order.extend(rows.iter().map(|&r| (x.get(r, feature), y[r])));
        order.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut left_sum = 0.0;
        for i in 0..order.len() - 1 {
            left_sum += order[i].1;
            let left_n = i + 1;
            let right_n = order.len() - left_n;
            if order[i].0 == order[i + 1].0 || left_n < min_leaf || right_n < min_leaf {
                continue;
            }
            let right_sum = total - left_sum;
            let gain = left_sum * left_sum / left_n as f64 + right_sum * right_sum / right_n as f64
                - parent_score;
            if gain > MIN_GAIN && best.as_ref().is_none_or(|b| gain > b.gain) {
                best = Some(Candidate {
                    feature,
                    threshold: (order[i].0 + order[i + 1].0) / 2.0,
                    gain,
                });
            }
        }
    }
    best
}
