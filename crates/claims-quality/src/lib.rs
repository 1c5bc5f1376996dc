//! Data quality and exploratory summaries for claims datasets.
//!
//! - [`summary`]: missing values, descriptive statistics, KPI and group profiles
//! - [`outliers`]: IQR fences per numeric column
//! - [`impute`]: policy-driven missing-value imputation

mod error;
pub mod impute;
pub mod outliers;
pub mod summary;

pub use error::{QualityError, Result};
pub use impute::{
    FillValue, ImputationPolicy, ImputeStrategy, ImputedColumn, apply_fill, fit_fill,
    impute_missing,
};
pub use outliers::{IQR_FACTOR, OutlierSummary, detect_outliers};
pub use summary::{
    CategoricalProfile, GroupStats, KpiDetail, KpiProfile, MissingCount, NumericSummary,
    categorical_profile, describe, drop_empty_columns, group_summary, kpi_profile,
    missing_summary, top_counts,
};
