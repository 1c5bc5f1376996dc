//! Options controlling how a claims extract is loaded.

use claims_model::{ColumnKind, fields};
use serde::{Deserialize, Serialize};

const NUMERIC_COLUMNS: &[&str] = &[
    "TotalPremium",
    "TotalClaims",
    "SumInsured",
    "CalculatedPremiumPerTerm",
    "CustomValueEstimate",
    "CapitalOutstanding",
    "Cylinders",
    "cubiccapacity",
    "kilowatts",
    "NumberOfDoors",
    "RegistrationYear",
];

const DATE_COLUMNS: &[&str] = &["TransactionMonth", "VehicleIntroDate"];

const BOOLEAN_COLUMNS: &[&str] = &[
    "AlarmImmobiliser",
    "TrackingDevice",
    "NewVehicle",
    "WrittenOff",
    "Rebuilt",
    "Converted",
    "CrossBorder",
];

/// Columns kept as text even when every value looks numeric.
const TEXT_COLUMNS: &[&str] = &["PostalCode", "UnderwrittenCoverID", "PolicyID", "mmcode"];

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| (*s).to_string()).collect()
}

/// Options for [`load_dataset`](crate::load_dataset).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Field separator of the input file.
    pub delimiter: char,
    /// Columns coerced to numbers; unparseable cells become missing.
    pub numeric_columns: Vec<String>,
    /// Columns parsed as calendar dates.
    pub date_columns: Vec<String>,
    /// Yes/no columns.
    pub boolean_columns: Vec<String>,
    /// Columns always read as categorical text.
    pub text_columns: Vec<String>,
    /// Columns that must be present.
    pub required_columns: Vec<String>,
    /// Capitalize categorical text (first letter upper, rest lower).
    pub normalize_case: bool,
    /// Add `Margin` and `HasClaim`.
    pub derive_columns: bool,
    /// Drop columns with no values at all.
    pub drop_empty_columns: bool,
    /// Read at most this many data rows.
    pub max_rows: Option<usize>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: ',',
            numeric_columns: owned(NUMERIC_COLUMNS),
            date_columns: owned(DATE_COLUMNS),
            boolean_columns: owned(BOOLEAN_COLUMNS),
            text_columns: owned(TEXT_COLUMNS),
            required_columns: owned(fields::REQUIRED),
            normalize_case: true,
            derive_columns: true,
            drop_empty_columns: true,
            max_rows: None,
        }
    }
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_normalize_case(mut self, enable: bool) -> Self {
        self.normalize_case = enable;
        self
    }

    pub fn with_required_columns(mut self, columns: Vec<String>) -> Self {
        self.required_columns = columns;
        self
    }

    pub fn with_max_rows(mut self, max_rows: Option<usize>) -> Self {
        self.max_rows = max_rows;
        self
    }

    /// Declared kind of a column, or `None` when it should be inferred.
    pub fn declared_kind(&self, column: &str) -> Option<ColumnKind> {
        let listed = |names: &[String]| names.iter().any(|n| n == column);
        if listed(&self.text_columns) {
            Some(ColumnKind::Categorical)
        } else if listed(&self.date_columns) {
            Some(ColumnKind::Date)
        } else if listed(&self.boolean_columns) {
            Some(ColumnKind::Boolean)
        } else if listed(&self.numeric_columns) {
            Some(ColumnKind::Numeric)
        } else {
            None
        }
    }
}
