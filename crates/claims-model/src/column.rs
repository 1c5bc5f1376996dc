//! Typed column storage.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use claims_common::format_numeric;
use serde::{Deserialize, Serialize};

/// Day number of 1970-01-01 counted from 0001-01-01 (day 1).
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Days between 1970-01-01 and `date`.
pub fn days_since_epoch(date: NaiveDate) -> i64 {
    i64::from(date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE)
}

/// Inverse of [`days_since_epoch`].
pub fn date_from_epoch_days(days: i64) -> Option<NaiveDate> {
    let ce = i32::try_from(days).ok()?.checked_add(UNIX_EPOCH_DAYS_FROM_CE)?;
    NaiveDate::from_num_days_from_ce_opt(ce)
}

/// Storage kind of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    Categorical,
    Boolean,
    Date,
}

impl ColumnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Categorical => "categorical",
            Self::Boolean => "boolean",
            Self::Date => "date",
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column values; `None` marks a missing cell.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Numeric(Vec<Option<f64>>),
    Categorical(Vec<Option<String>>),
    Boolean(Vec<Option<bool>>),
    Date(Vec<Option<NaiveDate>>),
}

impl ColumnData {
    pub fn kind(&self) -> ColumnKind {
        match self {
            Self::Numeric(_) => ColumnKind::Numeric,
            Self::Categorical(_) => ColumnKind::Categorical,
            Self::Boolean(_) => ColumnKind::Boolean,
            Self::Date(_) => ColumnKind::Date,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Numeric(v) => v.len(),
            Self::Categorical(v) => v.len(),
            Self::Boolean(v) => v.len(),
            Self::Date(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the value at `row` is missing. Out-of-range rows count as missing.
    pub fn is_missing(&self, row: usize) -> bool {
        match self {
            Self::Numeric(v) => !matches!(v.get(row), Some(Some(_))),
            Self::Categorical(v) => !matches!(v.get(row), Some(Some(_))),
            Self::Boolean(v) => !matches!(v.get(row), Some(Some(_))),
            Self::Date(v) => !matches!(v.get(row), Some(Some(_))),
        }
    }

    pub fn missing_count(&self) -> usize {
        (0..self.len()).filter(|&row| self.is_missing(row)).count()
    }

    /// Numeric view of a cell: numbers as-is, booleans as 0/1, dates as days
    /// since 1970-01-01. Categorical cells have no numeric view.
    pub fn numeric_value(&self, row: usize) -> Option<f64> {
        match self {
            Self::Numeric(v) => v.get(row).copied().flatten(),
            Self::Boolean(v) => v
                .get(row)
                .copied()
                .flatten()
                .map(|b| if b { 1.0 } else { 0.0 }),
            Self::Date(v) => v
                .get(row)
                .copied()
                .flatten()
                .map(|d| days_since_epoch(d) as f64),
            Self::Categorical(_) => None,
        }
    }

    /// Text label of a cell, used for grouping and export.
    pub fn label(&self, row: usize) -> Option<String> {
        match self {
            Self::Numeric(v) => v.get(row).copied().flatten().map(format_numeric),
            Self::Categorical(v) => v.get(row).cloned().flatten(),
            Self::Boolean(v) => v
                .get(row)
                .copied()
                .flatten()
                .map(|b| if b { "Yes" } else { "No" }.to_string()),
            Self::Date(v) => v
                .get(row)
                .copied()
                .flatten()
                .map(|d| d.format("%Y-%m-%d").to_string()),
        }
    }

    /// Non-missing numeric values in row order.
    pub fn numeric_values(&self) -> Vec<f64> {
        (0..self.len())
            .filter_map(|row| self.numeric_value(row))
            .collect()
    }

    /// Counts of each non-missing label.
    pub fn value_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for row in 0..self.len() {
            if let Some(label) = self.label(row) {
                *counts.entry(label).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Gather the given rows into a new column of the same kind.
    pub fn take(&self, rows: &[usize]) -> Self {
        fn gather<T: Clone>(values: &[Option<T>], rows: &[usize]) -> Vec<Option<T>> {
            rows.iter()
                .map(|&row| values.get(row).cloned().flatten())
                .collect()
        }
        match self {
            Self::Numeric(v) => Self::Numeric(gather(v, rows)),
            Self::Categorical(v) => Self::Categorical(gather(v, rows)),
            Self::Boolean(v) => Self::Boolean(gather(v, rows)),
            Self::Date(v) => Self::Date(gather(v, rows)),
        }
    }
}

/// A named column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn numeric(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self::new(name, ColumnData::Numeric(values))
    }

    pub fn categorical<S: Into<String>>(name: impl Into<String>, values: Vec<Option<S>>) -> Self {
        let values = values.into_iter().map(|v| v.map(Into::into)).collect();
        Self::new(name, ColumnData::Categorical(values))
    }

    pub fn boolean(name: impl Into<String>, values: Vec<Option<bool>>) -> Self {
        Self::new(name, ColumnData::Boolean(values))
    }

    pub fn date(name: impl Into<String>, values: Vec<Option<NaiveDate>>) -> Self {
        Self::new(name, ColumnData::Date(values))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut ColumnData {
        &mut self.data
    }

    pub fn into_data(self) -> ColumnData {
        self.data
    }

    pub fn kind(&self) -> ColumnKind {
        self.data.kind()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
