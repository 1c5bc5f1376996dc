//! Interquartile-range outlier detection.

use claims_common::stats::{quantile_sorted, sorted};
use claims_model::{ColumnKind, Dataset};
use serde::Serialize;

/// Fence multiplier applied to the IQR.
pub const IQR_FACTOR: f64 = 1.5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlierSummary {
    pub column: String,
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower_fence: f64,
    pub upper_fence: f64,
    /// Values strictly outside the fences.
    pub outliers: usize,
}

/// IQR fences and outlier counts for every numeric column with data.
pub fn detect_outliers(dataset: &Dataset) -> Vec<OutlierSummary> {
    dataset
        .columns()
        .iter()
        .filter(|c| c.kind() == ColumnKind::Numeric)
        .filter_map(|c| {
            let values = sorted(&c.data().numeric_values());
            let q1 = quantile_sorted(&values, 0.25)?;
            let q3 = quantile_sorted(&values, 0.75)?;
            let iqr = q3 - q1;
            let lower_fence = q1 - IQR_FACTOR * iqr;
            let upper_fence = q3 + IQR_FACTOR * iqr;
            let outliers = values
                .iter()
                .filter(|&&v| v < lower_fence || v > upper_fence)
                .count();
            Some(OutlierSummary {
                column: c.name().to_string(),
                q1,
                q3,
                iqr,
                lower_fence,
                upper_fence,
                outliers,
            })
        })
        .collect()
}
