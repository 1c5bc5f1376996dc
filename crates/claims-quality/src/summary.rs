//! Descriptive summaries of a dataset.

use std::collections::BTreeMap;

use claims_common::stats::{mean, quantile_sorted, sample_std, sorted};
use claims_model::{ColumnData, ColumnKind, Dataset};
use serde::Serialize;
use tracing::warn;

use crate::error::Result;

/// Missing-value count of one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissingCount {
    pub column: String,
    pub missing: usize,
    /// Share of rows missing, 0 to 100.
    pub percent: f64,
}

/// Columns with at least one missing value, in dataset order.
pub fn missing_summary(dataset: &Dataset) -> Vec<MissingCount> {
    let height = dataset.height();
    dataset
        .columns()
        .iter()
        .filter_map(|column| {
            let missing = column.data().missing_count();
            (missing > 0).then(|| MissingCount {
                column: column.name().to_string(),
                missing,
                percent: 100.0 * missing as f64 / height as f64,
            })
        })
        .collect()
}

/// Remove columns with no values at all and return their names.
pub fn drop_empty_columns(dataset: &mut Dataset) -> Vec<String> {
    let empty: Vec<String> = dataset
        .columns()
        .iter()
        .filter(|c| c.data().missing_count() == c.len())
        .map(|c| c.name().to_string())
        .collect();
    for name in &empty {
        warn!(column = %name, "dropping column with no values");
        dataset.drop_column(name);
    }
    empty
}

/// Count, mean, sample std and five-number summary of a numeric column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericSummary {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub median: f64,
    pub q75: f64,
    pub max: f64,
}

impl NumericSummary {
    /// Summary of the non-missing values; statistics are NaN when undefined.
    pub fn from_values(column: &str, values: &[f64]) -> Self {
        let sorted = sorted(values);
        let q = |p| quantile_sorted(&sorted, p).unwrap_or(f64::NAN);
        Self {
            column: column.to_string(),
            count: values.len(),
            mean: mean(values).unwrap_or(f64::NAN),
            std: sample_std(values).unwrap_or(f64::NAN),
            min: q(0.0),
            q25: q(0.25),
            median: q(0.5),
            q75: q(0.75),
            max: q(1.0),
        }
    }
}

/// Summaries of every numeric column.
pub fn describe(dataset: &Dataset) -> Vec<NumericSummary> {
    dataset
        .columns()
        .iter()
        .filter(|c| c.kind() == ColumnKind::Numeric)
        .map(|c| NumericSummary::from_values(c.name(), &c.data().numeric_values()))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoricalProfile {
    pub column: String,
    pub unique: usize,
    /// Most frequent labels, count descending then label ascending.
    pub top: Vec<(String, usize)>,
}

/// Unique count and most frequent labels of any column.
pub fn categorical_profile(
    dataset: &Dataset,
    column: &str,
    top_n: usize,
) -> Result<CategoricalProfile> {
    let counts = dataset.column(column)?.data().value_counts();
    Ok(CategoricalProfile {
        column: column.to_string(),
        unique: counts.len(),
        top: top_counts(counts, top_n),
    })
}

/// Sort counts descending, breaking ties by label.
pub fn top_counts(counts: BTreeMap<String, usize>, n: usize) -> Vec<(String, usize)> {
    let mut items: Vec<(String, usize)> = counts.into_iter().collect();
    items.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    items.truncate(n);
    items
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum KpiDetail {
    Numeric(NumericSummary),
    Categorical { counts: Vec<(String, usize)> },
}

/// Profile of a candidate outcome metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiProfile {
    pub column: String,
    pub observations: usize,
    pub missing: usize,
    pub unique: usize,
    pub detail: KpiDetail,
}

/// Profile a KPI column: numeric statistics for numeric columns, value counts
/// otherwise.
pub fn kpi_profile(dataset: &Dataset, column: &str) -> Result<KpiProfile> {
    let col = dataset.column(column)?;
    let data = col.data();
    let counts = data.value_counts();
    let detail = match data {
        ColumnData::Numeric(_) => {
            KpiDetail::Numeric(NumericSummary::from_values(column, &data.numeric_values()))
        }
        _ => KpiDetail::Categorical {
            counts: top_counts(counts.clone(), usize::MAX),
        },
    };
    Ok(KpiProfile {
        column: column.to_string(),
        observations: data.len(),
        missing: data.missing_count(),
        unique: counts.len(),
        detail,
    })
}

/// Statistics of a numeric value within one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStats {
    pub group: String,
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub sum: f64,
}

/// Per-group count, mean, median, std and sum of `value_column`, sorted by
/// group label. Rows missing either field are skipped.
pub fn group_summary(
    dataset: &Dataset,
    group_column: &str,
    value_column: &str,
) -> Result<Vec<GroupStats>> {
    let groups = dataset.column(group_column)?.data();
    let values = dataset.column(value_column)?.data();

    let mut buckets: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for row in 0..dataset.height() {
        if let (Some(label), Some(value)) = (groups.label(row), values.numeric_value(row)) {
            buckets.entry(label).or_default().push(value);
        }
    }

    Ok(buckets
        .into_iter()
        .map(|(group, values)| {
            let summary = NumericSummary::from_values(value_column, &values);
            GroupStats {
                group,
                count: values.len(),
                mean: summary.mean,
                median: summary.median,
                std: summary.std,
                sum: values.iter().sum(),
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use claims_model::Column;

    fn sample() -> Dataset {
        Dataset::new(vec![
            Column::categorical(
                "Province",
                vec![Some("Gauteng"), Some("Gauteng"), Some("Limpopo"), None],
            ),
            Column::numeric("TotalClaims", vec![Some(0.0), Some(100.0), Some(50.0), None]),
            Column::numeric("Empty", vec![None, None, None, None]),
        ])
        .unwrap()
    }

    #[test]
    fn missing_counts() {
        let summary = missing_summary(&sample());
        assert_eq!(summary.len(), 3);
        assert_eq!(summary[0].column, "Province");
        assert_eq!(summary[0].missing, 1);
        assert_eq!(summary[0].percent, 25.0);
        assert_eq!(summary[2].percent, 100.0);
    }

    #[test]
    fn drops_only_empty() {
        let mut ds = sample();
        assert_eq!(drop_empty_columns(&mut ds), vec!["Empty".to_string()]);
        assert_eq!(ds.width(), 2);
    }

    #[test]
    fn describe_numeric() {
        let stats = describe(&sample());
        assert_eq!(stats.len(), 2);
        let claims = &stats[0];
        assert_eq!(claims.count, 3);
        assert_eq!(claims.mean, 50.0);
        assert_eq!(claims.median, 50.0);
        assert_eq!(claims.q25, 25.0);
        assert_eq!(claims.max, 100.0);
        assert!((claims.std - 50.0).abs() < 1e-12);
        assert!(stats[1].mean.is_nan());
    }

    #[test]
    fn profiles() {
        let ds = sample();
        let profile = categorical_profile(&ds, "Province", 1).unwrap();
        assert_eq!(profile.unique, 2);
        assert_eq!(profile.top, vec![("Gauteng".to_string(), 2)]);

        let kpi = kpi_profile(&ds, "TotalClaims").unwrap();
        assert_eq!(kpi.observations, 4);
        assert_eq!(kpi.missing, 1);
        assert_eq!(kpi.unique, 3);
        assert!(matches!(kpi.detail, KpiDetail::Numeric(_)));

        let kpi = kpi_profile(&ds, "Province").unwrap();
        assert!(matches!(kpi.detail, KpiDetail::Categorical { ref counts } if counts.len() == 2));

        assert!(kpi_profile(&ds, "Gender").is_err());
    }

    #[test]
    fn per_group() {
        let stats = group_summary(&sample(), "Province", "TotalClaims").unwrap();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].group, "Gauteng");
        assert_eq!(stats[0].count, 2);
        assert_eq!(stats[0].sum, 100.0);
        assert_eq!(stats[0].mean, 50.0);
        assert_eq!(stats[1].group, "Limpopo");
        assert!(stats[1].std.is_nan());
    }
}
