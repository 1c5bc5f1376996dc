//! Missing-value imputation.
//!
//! Fill values are computed with [`fit_fill`] and written with
//! [`apply_fill`], so that callers can fit on one subset of rows and apply to
//! another.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use claims_common::parse_bool;
use claims_common::parse_numeric;
use claims_common::stats::{mean, median};
use claims_model::{ColumnData, ColumnKind, Dataset, date_from_epoch_days};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{QualityError, Result};

/// How to fill the missing cells of a column.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImputeStrategy {
    /// Median for numbers and dates, mode for text and flags.
    #[default]
    Auto,
    Median,
    Mean,
    Mode,
    /// Fill with a literal, parsed as the column kind.
    Constant(String),
    /// Keep missing cells.
    Leave,
}

impl ImputeStrategy {
    fn name(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Median => "median",
            Self::Mean => "mean",
            Self::Mode => "mode",
            Self::Constant(_) => "constant",
            Self::Leave => "leave",
        }
    }

    /// Concrete strategy for a column kind.
    pub fn resolve(&self, kind: ColumnKind) -> Self {
        match (self, kind) {
            (Self::Auto, ColumnKind::Numeric | ColumnKind::Date) => Self::Median,
            (Self::Auto, ColumnKind::Categorical | ColumnKind::Boolean) => Self::Mode,
            (other, _) => other.clone(),
        }
    }
}

/// Per-column strategies; columns without an override use `default`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImputationPolicy {
    pub default: ImputeStrategy,
    pub overrides: BTreeMap<String, ImputeStrategy>,
}

impl ImputationPolicy {
    pub fn strategy_for(&self, column: &str) -> &ImputeStrategy {
        self.overrides.get(column).unwrap_or(&self.default)
    }
}

/// A value that replaces missing cells.
#[derive(Debug, Clone, PartialEq)]
pub enum FillValue {
    Number(f64),
    Text(String),
    Flag(bool),
    Date(NaiveDate),
}

/// Compute the fill value for `data`. Returns `None` for [`ImputeStrategy::Leave`]
/// or when the column has no values to learn from.
pub fn fit_fill(column: &str, data: &ColumnData, strategy: &ImputeStrategy) -> Result<Option<FillValue>> {
    let strategy = strategy.resolve(data.kind());
    let unsupported = || QualityError::UnsupportedStrategy {
        column: column.to_string(),
        kind: data.kind(),
        strategy: strategy.name(),
    };
    let fill = match (&strategy, data) {
        (ImputeStrategy::Leave, _) => None,
        (ImputeStrategy::Constant(value), _) => Some(parse_constant(column, data.kind(), value)?),
        (ImputeStrategy::Median, ColumnData::Numeric(_)) => {
            median(&data.numeric_values()).map(FillValue::Number)
        }
        (ImputeStrategy::Mean, ColumnData::Numeric(_)) => {
            mean(&data.numeric_values()).map(FillValue::Number)
        }
        (ImputeStrategy::Median, ColumnData::Date(_)) => median(&data.numeric_values())
            .and_then(|days| date_from_epoch_days(days.round() as i64))
            .map(FillValue::Date),
        (ImputeStrategy::Mean, ColumnData::Date(_)) => mean(&data.numeric_values())
            .and_then(|days| date_from_epoch_days(days.round() as i64))
            .map(FillValue::Date),
        (ImputeStrategy::Mode, ColumnData::Numeric(values)) => {
            mode_of(values.iter().flatten().map(|v| OrderedF64(*v))).map(|v| FillValue::Number(v.0))
        }
        (ImputeStrategy::Mode, ColumnData::Date(values)) => {
            mode_of(values.iter().flatten().copied()).map(FillValue::Date)
        }
        (ImputeStrategy::Mode, ColumnData::Categorical(values)) => {
            mode_of(values.iter().flatten().cloned()).map(FillValue::Text)
        }
        (ImputeStrategy::Mode, ColumnData::Boolean(values)) => {
            mode_of(values.iter().flatten().copied()).map(FillValue::Flag)
        }
        _ => return Err(unsupported()),
    };
    Ok(fill)
}

fn parse_constant(column: &str, kind: ColumnKind, value: &str) -> Result<FillValue> {
    let parsed = match kind {
        ColumnKind::Numeric => parse_numeric(value).map(FillValue::Number),
        ColumnKind::Boolean => parse_bool(value).map(FillValue::Flag),
        ColumnKind::Date => NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
            .ok()
            .map(FillValue::Date),
        ColumnKind::Categorical => Some(FillValue::Text(value.to_string())),
    };
    parsed.ok_or_else(|| QualityError::InvalidConstant {
        column: column.to_string(),
        kind,
        value: value.to_string(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct OrderedF64(f64);

impl Eq for OrderedF64 {}

impl PartialOrd for OrderedF64 {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedF64 {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Most frequent value; ties go to the smallest.
fn mode_of<T: Ord>(values: impl Iterator<Item = T>) -> Option<T> {
    let mut counts: BTreeMap<T, usize> = BTreeMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }
    let best = counts.values().copied().max()?;
    counts.into_iter().find(|(_, n)| *n == best).map(|(v, _)| v)
}

/// Replace missing cells with `fill`. Returns the new data and the number of
/// cells filled; a fill of the wrong kind leaves the data unchanged.
pub fn apply_fill(data: &ColumnData, fill: &FillValue) -> (ColumnData, usize) {
    fn fill_with<T: Clone>(values: &[Option<T>], value: &T) -> (Vec<Option<T>>, usize) {
        let mut filled = 0;
        let out = values
            .iter()
            .map(|v| {
                if v.is_none() {
                    filled += 1;
                }
                Some(v.clone().unwrap_or_else(|| value.clone()))
            })
            .collect();
        (out, filled)
    }
    match (data, fill) {
        (ColumnData::Numeric(v), FillValue::Number(x)) => {
            let (out, n) = fill_with(v, x);
            (ColumnData::Numeric(out), n)
        }
        (ColumnData::Categorical(v), FillValue::Text(x)) => {
            let (out, n) = fill_with(v, x);
            (ColumnData::Categorical(out), n)
        }
        (ColumnData::Boolean(v), FillValue::Flag(x)) => {
            let (out, n) = fill_with(v, x);
            (ColumnData::Boolean(out), n)
        }
        (ColumnData::Date(v), FillValue::Date(x)) => {
            let (out, n) = fill_with(v, x);
            (ColumnData::Date(out), n)
        }
        _ => (data.clone(), 0),
    }
}

/// Record of one imputed column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImputedColumn {
    pub column: String,
    pub strategy: String,
    pub filled: usize,
}

/// Impute every column of `dataset` in place according to `policy`.
pub fn impute_missing(dataset: &mut Dataset, policy: &ImputationPolicy) -> Result<Vec<ImputedColumn>> {
    let names: Vec<String> = dataset
        .column_names()
        .into_iter()
        .map(str::to_string)
        .collect();
    let mut report = Vec::new();
    for name in names {
        let data = dataset.column(&name)?.data();
        if data.missing_count() == 0 {
            continue;
        }
        let strategy = policy.strategy_for(&name).resolve(data.kind());
        let Some(fill) = fit_fill(&name, data, &strategy)? else {
            continue;
        };
        let (filled_data, filled) = apply_fill(data, &fill);
        dataset.replace_data(&name, filled_data)?;
        debug!(column = %name, strategy = strategy.name(), filled, "imputed missing values");
        report.push(ImputedColumn {
            column: name,
            strategy: strategy.name().to_string(),
            filled,
        });
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use claims_model::Column;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample() -> Dataset {
        Dataset::new(vec![
            Column::numeric("CapitalOutstanding", vec![Some(1.0), Some(3.0), Some(10.0), None]),
            Column::categorical("Bodytype", vec![Some("Sedan"), Some("Bus"), Some("Bus"), None]),
            Column::boolean("NewVehicle", vec![Some(true), None, Some(false), Some(false)]),
            Column::date(
                "VehicleIntroDate",
                vec![Some(date(2010, 1, 1)), None, Some(date(2010, 1, 3)), None],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn auto_policy_fills_every_kind() {
        let mut ds = sample();
        let report = impute_missing(&mut ds, &ImputationPolicy::default()).unwrap();
        assert_eq!(report.len(), 4);

        let data = ds.column("CapitalOutstanding").unwrap().data();
        assert_eq!(data.numeric_value(3), Some(3.0));
        let data = ds.column("Bodytype").unwrap().data();
        assert_eq!(data.label(3).as_deref(), Some("Bus"));
        let data = ds.column("NewVehicle").unwrap().data();
        assert_eq!(data.label(1).as_deref(), Some("No"));
        assert_eq!(
            ds.column("VehicleIntroDate").unwrap().data(),
            &ColumnData::Date(vec![
                Some(date(2010, 1, 1)),
                Some(date(2010, 1, 2)),
                Some(date(2010, 1, 3)),
                Some(date(2010, 1, 2)),
            ])
        );
        assert!(report.iter().all(|r| r.filled > 0));
    }

    #[test]
    fn overrides_apply() {
        let mut ds = sample();
        let mut policy = ImputationPolicy::default();
        policy
            .overrides
            .insert("CapitalOutstanding".to_string(), ImputeStrategy::Constant("0".to_string()));
        policy
            .overrides
            .insert("Bodytype".to_string(), ImputeStrategy::Leave);
        impute_missing(&mut ds, &policy).unwrap();

        let data = ds.column("CapitalOutstanding").unwrap().data();
        assert_eq!(data.numeric_value(3), Some(0.0));
        assert!(ds.column("Bodytype").unwrap().data().is_missing(3));
    }

    #[test]
    fn rejects_unsupported_strategy() {
        let mut ds = sample();
        let mut policy = ImputationPolicy::default();
        policy
            .overrides
            .insert("Bodytype".to_string(), ImputeStrategy::Mean);
        let err = impute_missing(&mut ds, &policy).unwrap_err();
        assert!(matches!(err, QualityError::UnsupportedStrategy { .. }));

        let data = ColumnData::Numeric(vec![None]);
        let err = fit_fill("x", &data, &ImputeStrategy::Constant("abc".into())).unwrap_err();
        assert!(matches!(err, QualityError::InvalidConstant { .. }));
    }

    #[test]
    fn numeric_mode_prefers_smallest_on_ties() {
        let data = ColumnData::Numeric(vec![Some(5.0), Some(2.0), Some(5.0), Some(2.0), None]);
        let fill = fit_fill("x", &data, &ImputeStrategy::Mode).unwrap();
        assert_eq!(fill, Some(FillValue::Number(2.0)));
    }

    #[test]
    fn policy_parses_from_json() {
        let policy: ImputationPolicy =
            serde_json::from_str(r#"{"overrides": {"Gender": {"constant": "Unknown"}, "Bank": "leave"}}"#)
                .unwrap();
        assert_eq!(policy.default, ImputeStrategy::Auto);
        assert_eq!(
            policy.strategy_for("Gender"),
            &ImputeStrategy::Constant("Unknown".to_string())
        );
        assert_eq!(policy.strategy_for("Bank"), &ImputeStrategy::Leave);
    }
}
