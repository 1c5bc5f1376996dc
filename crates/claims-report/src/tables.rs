//! Tabular exports built as Polars frames and written as CSV.

use std::fs::{self, File};
use std::path::Path;

use anyhow::{Context, Result};
use claims_ml::ModelReport;
use claims_model::{
    ClassificationMetrics, ColumnData, Dataset, ModelMetrics, RegressionMetrics, TestResult,
};
use claims_quality::{GroupStats, MissingCount, NumericSummary, OutlierSummary};
use polars::prelude::{
    Column as PlColumn, CsvWriter, DataFrame, IntoColumn, NamedFrom, PlSmallStr, SerWriter, Series,
};
use tracing::debug;

fn text_column(name: &str, values: Vec<String>) -> PlColumn {
    Series::new(name.into(), values).into_column()
}

fn float_column(name: &str, values: Vec<f64>) -> PlColumn {
    // NaN is written as an empty cell.
    let values: Vec<Option<f64>> = values.into_iter().map(|v| (!v.is_nan()).then_some(v)).collect();
    Series::new(name.into(), values).into_column()
}

fn count_column(name: &str, values: Vec<u64>) -> PlColumn {
    Series::new(name.into(), values).into_column()
}

fn frame(columns: Vec<PlColumn>) -> Result<DataFrame> {
    DataFrame::new(columns).context("build export frame")
}

/// Write `df` as a headed CSV, creating parent directories.
pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let mut file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)
        .with_context(|| format!("write {}", path.display()))?;
    debug!(path = %path.display(), rows = df.height(), "csv written");
    Ok(())
}

/// The dataset itself, dates as `YYYY-MM-DD` and flags as booleans.
pub fn dataset_frame(dataset: &Dataset) -> Result<DataFrame> {
    let columns = dataset
        .columns()
        .iter()
        .map(|column| {
            let name = PlSmallStr::from(column.name());
            let series = match column.data() {
                ColumnData::Numeric(values) => Series::new(name, values.clone()),
                ColumnData::Categorical(values) => Series::new(name, values.clone()),
                ColumnData::Boolean(values) => Series::new(name, values.clone()),
                ColumnData::Date(values) => Series::new(
                    name,
                    values
                        .iter()
                        .map(|d| d.map(|d| d.format("%Y-%m-%d").to_string()))
                        .collect::<Vec<_>>(),
                ),
            };
            series.into_column()
        })
        .collect();
    frame(columns)
}

pub fn describe_frame(summaries: &[NumericSummary]) -> Result<DataFrame> {
    let pick = |f: fn(&NumericSummary) -> f64| summaries.iter().map(f).collect::<Vec<_>>();
    frame(vec![
        text_column("column", summaries.iter().map(|s| s.column.clone()).collect()),
        count_column("count", summaries.iter().map(|s| s.count as u64).collect()),
        float_column("mean", pick(|s| s.mean)),
        float_column("std", pick(|s| s.std)),
        float_column("min", pick(|s| s.min)),
        float_column("25%", pick(|s| s.q25)),
        float_column("50%", pick(|s| s.median)),
        float_column("75%", pick(|s| s.q75)),
        float_column("max", pick(|s| s.max)),
    ])
}

pub fn missing_frame(missing: &[MissingCount]) -> Result<DataFrame> {
    frame(vec![
        text_column("column", missing.iter().map(|m| m.column.clone()).collect()),
        count_column("missing", missing.iter().map(|m| m.missing as u64).collect()),
        float_column("percent", missing.iter().map(|m| m.percent).collect()),
    ])
}

pub fn outlier_frame(outliers: &[OutlierSummary]) -> Result<DataFrame> {
    let pick = |f: fn(&OutlierSummary) -> f64| outliers.iter().map(f).collect::<Vec<_>>();
    frame(vec![
        text_column("column", outliers.iter().map(|o| o.column.clone()).collect()),
        float_column("q1", pick(|o| o.q1)),
        float_column("q3", pick(|o| o.q3)),
        float_column("iqr", pick(|o| o.iqr)),
        float_column("lower_fence", pick(|o| o.lower_fence)),
        float_column("upper_fence", pick(|o| o.upper_fence)),
        count_column("outliers", outliers.iter().map(|o| o.outliers as u64).collect()),
    ])
}

pub fn group_frame(field: &str, groups: &[GroupStats]) -> Result<DataFrame> {
    let pick = |f: fn(&GroupStats) -> f64| groups.iter().map(f).collect::<Vec<_>>();
    frame(vec![
        text_column(field, groups.iter().map(|g| g.group.clone()).collect()),
        count_column("count", groups.iter().map(|g| g.count as u64).collect()),
        float_column("mean", pick(|g| g.mean)),
        float_column("median", pick(|g| g.median)),
        float_column("std", pick(|g| g.std)),
        float_column("sum", pick(|g| g.sum)),
    ])
}

/// One row per test; group labels joined with ` vs `.
pub fn test_results_frame(results: &[TestResult]) -> Result<DataFrame> {
    let optional = |f: fn(&TestResult) -> Option<f64>| {
        results.iter().map(|r| f(r).unwrap_or(f64::NAN)).collect::<Vec<_>>()
    };
    frame(vec![
        text_column("hypothesis", results.iter().map(|r| r.hypothesis.clone()).collect()),
        text_column("field", results.iter().map(|r| r.field.clone()).collect()),
        text_column("metric", results.iter().map(|r| r.metric.clone()).collect()),
        text_column(
            "groups",
            results
                .iter()
                .map(|r| {
                    r.groups
                        .iter()
                        .map(|g| g.label.as_str())
                        .collect::<Vec<_>>()
                        .join(" vs ")
                })
                .collect(),
        ),
        text_column("test", results.iter().map(|r| r.kind.to_string()).collect()),
        float_column("statistic", results.iter().map(|r| r.statistic).collect()),
        float_column("p_value", results.iter().map(|r| r.p_value).collect()),
        float_column("df", optional(|r| r.degrees_of_freedom)),
        float_column("alpha", results.iter().map(|r| r.alpha).collect()),
        text_column("decision", results.iter().map(|r| r.decision.to_string()).collect()),
    ])
}

fn regression(metrics: &ModelMetrics) -> Option<RegressionMetrics> {
    match metrics {
        ModelMetrics::Regression(r) => Some(*r),
        ModelMetrics::Classification(_) => None,
    }
}

fn classification(metrics: &ModelMetrics) -> Option<ClassificationMetrics> {
    match metrics {
        ModelMetrics::Classification(c) => Some(*c),
        ModelMetrics::Regression(_) => None,
    }
}

/// Test-split metrics per model; columns depend on the task of the first
/// report.
pub fn model_comparison_frame(reports: &[ModelReport]) -> Result<DataFrame> {
    let names = text_column("model", reports.iter().map(|r| r.model.to_string()).collect());
    let is_regression = matches!(
        reports.first().map(|r| r.metrics),
        Some(ModelMetrics::Regression(_)) | None
    );
    let metric = |f: fn(&ModelMetrics) -> Option<f64>| {
        reports.iter().map(|r| f(&r.metrics).unwrap_or(f64::NAN)).collect::<Vec<_>>()
    };
    let mut columns = vec![names];
    if is_regression {
        columns.extend([
            float_column("mae", metric(|m| regression(m).map(|r| r.mae))),
            float_column("mse", metric(|m| regression(m).map(|r| r.mse))),
            float_column("rmse", metric(|m| regression(m).map(|r| r.rmse))),
            float_column("r2", metric(|m| regression(m).map(|r| r.r2))),
        ]);
    } else {
        columns.extend([
            float_column("accuracy", metric(|m| classification(m).map(|c| c.accuracy))),
            float_column("precision", metric(|m| classification(m).map(|c| c.precision))),
            float_column("recall", metric(|m| classification(m).map(|c| c.recall))),
            float_column("f1", metric(|m| classification(m).map(|c| c.f1))),
        ]);
    }
    columns.push(count_column(
        "duration_ms",
        reports.iter().map(|r| r.duration_ms).collect(),
    ));
    frame(columns)
}

/// Long format: one row per (model, method, feature) with its rank.
pub fn importance_frame(reports: &[ModelReport]) -> Result<DataFrame> {
    let mut model = Vec::new();
    let mut method = Vec::new();
    let mut feature = Vec::new();
    let mut rank = Vec::new();
    let mut importance = Vec::new();
    for report in reports {
        for (name, list) in [
            ("impurity", &report.impurity_importances),
            ("permutation", &report.permutation_importances),
            ("shapley", &report.shapley_importances),
        ] {
            for (i, item) in list.iter().enumerate() {
                model.push(report.model.to_string());
                method.push(name.to_string());
                feature.push(item.feature.clone());
                rank.push(i as u64 + 1);
                importance.push(item.importance);
            }
        }
    }
    frame(vec![
        text_column("model", model),
        text_column("method", method),
        text_column("feature", feature),
        count_column("rank", rank),
        float_column("importance", importance),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use claims_model::Column;

    #[test]
    fn dataset_roundtrips_to_frame() {
        let ds = Dataset::new(vec![
            Column::numeric("TotalPremium", vec![Some(1.5), None]),
            Column::categorical("Province", vec![Some("Gauteng"), None]),
            Column::boolean("HasClaim", vec![Some(true), Some(false)]),
            Column::date("TransactionMonth", vec![NaiveDate::from_ymd_opt(2015, 3, 1), None]),
        ])
        .unwrap();
        let df = dataset_frame(&ds).unwrap();
        assert_eq!(df.shape(), (2, 4));
        assert_eq!(df.column("TotalPremium").unwrap().null_count(), 1);
        let months = df.column("TransactionMonth").unwrap();
        assert_eq!(
            months.as_materialized_series().str().unwrap().get(0),
            Some("2015-03-01")
        );
    }

    #[test]
    fn nan_becomes_null() {
        let summary = NumericSummary::from_values("x", &[]);
        let df = describe_frame(&[summary]).unwrap();
        assert_eq!(df.column("mean").unwrap().null_count(), 1);
        assert_eq!(df.get_column_names().len(), 9);
    }
}
