//! Ordinary least squares on standardized features.

use crate::error::{MlError, Result};
use crate::features::Task;
use crate::matrix::Matrix;

use super::Predictor;

/// Columns with a smaller standard deviation are treated as constant.
const CONSTANT_STD: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel {
    intercept: f64,
    /// Coefficients on the original feature scale.
    coefficients: Vec<f64>,
    /// Clamp predictions to [0, 1] (linear probability model).
    clamp: bool,
}

impl LinearModel {
    /// Fit `y = b0 + X b` by solving the ridge-regularized normal equations
    /// of the standardized problem. Constant columns get a zero coefficient.
    pub fn fit(x: &Matrix, y: &[f64], task: Task, ridge: f64) -> Result<Self> {
        let n = x.n_rows() as f64;
        let means = x.column_means();
        let stds: Vec<f64> = (0..x.n_cols())
            .map(|j| {
                let var = x.rows().map(|r| (r[j] - means[j]).powi(2)).sum::<f64>() / n;
                var.sqrt()
            })
            .collect();
        let active: Vec<usize> = (0..x.n_cols()).filter(|&j| stds[j] > CONSTANT_STD).collect();
        let y_mean = y.iter().sum::<f64>() / n;

        let k = active.len();
        let mut gram = vec![vec![0.0; k]; k];
        let mut rhs = vec![0.0; k];
        let mut z = vec![0.0; k];
        for (row, target) in x.rows().zip(y) {
            for (slot, &j) in active.iter().enumerate() {
                z[slot] = (row[j] - means[j]) / stds[j];
            }
            for a in 0..k {
                rhs[a] += z[a] * (target - y_mean);
                for b in a..k {
                    gram[a][b] += z[a] * z[b];
                }
            }
        }
        for a in 0..k {
            for b in 0..a {
                gram[a][b] = gram[b][a];
            }
            gram[a][a] += ridge * n;
        }
        let weights = solve(gram, rhs).ok_or_else(|| {
            MlError::InvalidConfig("normal equations are singular; increase ridge".to_string())
        })?;

        let mut coefficients = vec![0.0; x.n_cols()];
        let mut intercept = y_mean;
        for (w, &j) in weights.iter().zip(&active) {
            coefficients[j] = w / stds[j];
            intercept -= coefficients[j] * means[j];
        }
        Ok(Self {
            intercept,
            coefficients,
            clamp: task == Task::Classification,
        })
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }
}

impl Predictor for LinearModel {
    fn predict_row(&self, row: &[f64]) -> f64 {
        let raw = self.intercept
            + self
                .coefficients
                .iter()
                .zip(row)
                .map(|(b, x)| b * x)
                .sum::<f64>();
        if self.clamp { raw.clamp(0.0, 1.0) } else { raw }
    }
}

/// Gaussian elimination with partial pivoting. `None` when singular.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);
        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                let delta = factor * a[col][k];
                a[row][k] -= delta;
            }
            let delta = factor * b[col];
            b[row] -= delta;
        }
    }
    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Some(x)
}
