//! Outcome metrics compared between groups.

use claims_model::{ColumnKind, Dataset, MetricKind, fields};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A dataset column tested for differences between groups, with the kind
/// that selects the test family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeMetric {
    /// Display name in results and reports.
    pub name: String,
    pub column: String,
    pub kind: MetricKind,
}

impl OutcomeMetric {
    pub fn new(name: impl Into<String>, column: impl Into<String>, kind: MetricKind) -> Self {
        Self {
            name: name.into(),
            column: column.into(),
            kind,
        }
    }

    /// Share of policies with at least one claim.
    pub fn claim_frequency() -> Self {
        Self::new("claim frequency", fields::HAS_CLAIM, MetricKind::Categorical)
    }

    /// Premium minus claims.
    pub fn margin() -> Self {
        Self::new("margin", fields::MARGIN, MetricKind::Continuous)
    }

    pub fn premium() -> Self {
        Self::new("premium", fields::TOTAL_PREMIUM, MetricKind::Continuous)
    }

    /// Metric over any column: continuous for numbers and dates, categorical
    /// for text and flags.
    pub fn for_column(dataset: &Dataset, column: &str) -> Result<Self> {
        let kind = match dataset.column(column)?.kind() {
            ColumnKind::Numeric | ColumnKind::Date => MetricKind::Continuous,
            ColumnKind::Categorical | ColumnKind::Boolean => MetricKind::Categorical,
        };
        Ok(Self::new(column, column, kind))
    }

    /// Resolve the names accepted on the command line: `claim_frequency`,
    /// `margin`, `premium`, or a column name.
    pub fn parse(dataset: &Dataset, name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "claim_frequency" | "frequency" => Ok(Self::claim_frequency()),
            "margin" => Ok(Self::margin()),
            "premium" => Ok(Self::premium()),
            _ => Self::for_column(dataset, name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claims_model::Column;

    #[test]
    fn resolves_names_and_columns() {
        let ds = Dataset::new(vec![
            Column::numeric("CustomValueEstimate", vec![Some(1.0)]),
            Column::categorical("VehicleType", vec![Some("Bus")]),
        ])
        .unwrap();
        assert_eq!(OutcomeMetric::parse(&ds, "Claim-Frequency").unwrap(), OutcomeMetric::claim_frequency());
        assert_eq!(OutcomeMetric::parse(&ds, "margin").unwrap().column, "Margin");
        assert_eq!(
            OutcomeMetric::parse(&ds, "CustomValueEstimate").unwrap().kind,
            MetricKind::Continuous
        );
        assert_eq!(
            OutcomeMetric::parse(&ds, "VehicleType").unwrap().kind,
            MetricKind::Categorical
        );
        assert!(OutcomeMetric::parse(&ds, "Nope").is_err());
    }
}
