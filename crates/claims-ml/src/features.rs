//! Feature pipeline: target extraction, imputation, categorical encoding and
//! the train/test split.
//!
//! Imputation values and category vocabularies are learned from training rows
//! only; the resulting [`FittedEncoder`] is applied unchanged to both splits.

use std::borrow::Cow;
use std::time::Instant;

use claims_model::{Column, ColumnData, ColumnKind, Dataset, days_since_epoch, fields};
use claims_quality::{FillValue, ImputationPolicy, ImputeStrategy, apply_fill, fit_fill};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{MlError, Result};
use crate::matrix::Matrix;
use crate::split::train_test_split;

/// Label of the one-hot indicator for categories unseen during fitting.
pub const UNKNOWN_CATEGORY: &str = "<unknown>";

/// Columns never used as features unless listed explicitly.
const DEFAULT_EXCLUDE: &[&str] = &[
    fields::TOTAL_PREMIUM,
    fields::TOTAL_CLAIMS,
    fields::MARGIN,
    fields::HAS_CLAIM,
    fields::UNDERWRITTEN_COVER_ID,
    fields::POLICY_ID,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Task {
    #[default]
    Regression,
    /// Binary outcome; the positive class is `true` / 1.
    Classification,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    /// One indicator per training category plus an unknown indicator.
    #[default]
    OneHot,
    /// Sorted categories coded `1..=k`; unknown is `0`.
    Ordinal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    pub target: String,
    pub task: Task,
    /// Explicit feature list; `None` uses every column not excluded.
    pub features: Option<Vec<String>>,
    pub exclude: Vec<String>,
    /// Fields whose missing rows are dropped rather than imputed.
    pub drop_missing: Vec<String>,
    pub encoding: Encoding,
    /// One-hot fields with more training categories fall back to ordinal.
    pub max_one_hot_categories: usize,
    pub train_ratio: f64,
    pub seed: u64,
    /// Add `PremiumToSumRatio` when premium and sum insured are present.
    pub derive_ratio: bool,
    pub imputation: ImputationPolicy,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            target: fields::TOTAL_CLAIMS.to_string(),
            task: Task::Regression,
            features: None,
            exclude: DEFAULT_EXCLUDE.iter().map(|s| (*s).to_string()).collect(),
            drop_missing: Vec::new(),
            encoding: Encoding::OneHot,
            max_one_hot_categories: 20,
            train_ratio: 0.8,
            seed: 42,
            derive_ratio: true,
            imputation: ImputationPolicy::default(),
        }
    }
}

/// Add `PremiumToSumRatio = TotalPremium / SumInsured`, missing when either
/// side is missing or the sum insured is zero. Returns false when the inputs
/// are not both present as numeric columns.
pub fn add_premium_ratio(dataset: &mut Dataset) -> Result<bool> {
    let (Some(premium), Some(sum)) = (
        dataset.get_column(fields::TOTAL_PREMIUM),
        dataset.get_column(fields::SUM_INSURED),
    ) else {
        return Ok(false);
    };
    let (ColumnData::Numeric(premium), ColumnData::Numeric(sum)) = (premium.data(), sum.data())
    else {
        return Ok(false);
    };
    let ratio: Vec<Option<f64>> = premium
        .iter()
        .zip(sum)
        .map(|(p, s)| match (p, s) {
            (Some(p), Some(s)) if *s != 0.0 => Some(p / s),
            _ => None,
        })
        .collect();
    dataset.upsert_column(Column::numeric(fields::PREMIUM_TO_SUM_RATIO, ratio))?;
    Ok(true)
}

/// Encoding of one source column.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureEncoder {
    /// Numbers, flags (0/1) and dates (days since 1970-01-01).
    Numeric { column: String, fill: f64 },
    Ordinal {
        column: String,
        vocabulary: Vec<String>,
        fill: Option<String>,
    },
    OneHot {
        column: String,
        vocabulary: Vec<String>,
        fill: Option<String>,
    },
}

impl FeatureEncoder {
    pub fn column(&self) -> &str {
        match self {
            Self::Numeric { column, .. }
            | Self::Ordinal { column, .. }
            | Self::OneHot { column, .. } => column,
        }
    }

    fn output_names(&self) -> Vec<String> {
        match self {
            Self::Numeric { column, .. } | Self::Ordinal { column, .. } => vec![column.clone()],
            Self::OneHot {
                column, vocabulary, ..
            } => vocabulary
                .iter()
                .map(|v| format!("{column}={v}"))
                .chain([format!("{column}={UNKNOWN_CATEGORY}")])
                .collect(),
        }
    }

    fn encode(&self, data: &ColumnData, row: usize, out: &mut Vec<f64>) {
        match self {
            Self::Numeric { fill, .. } => out.push(data.numeric_value(row).unwrap_or(*fill)),
            Self::Ordinal {
                vocabulary, fill, ..
            } => {
                let code = lookup(vocabulary, data.label(row).or_else(|| fill.clone()))
                    .map_or(0, |i| i + 1);
                out.push(code as f64);
            }
            Self::OneHot {
                vocabulary, fill, ..
            } => {
                let hot = lookup(vocabulary, data.label(row).or_else(|| fill.clone()))
                    .unwrap_or(vocabulary.len());
                out.extend((0..=vocabulary.len()).map(|i| if i == hot { 1.0 } else { 0.0 }));
            }
        }
    }
}

fn lookup(vocabulary: &[String], label: Option<String>) -> Option<usize> {
    label.and_then(|l| vocabulary.binary_search(&l).ok())
}

/// Encoders for every selected feature, learned from training rows.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedEncoder {
    encoders: Vec<FeatureEncoder>,
    feature_names: Vec<String>,
}

impl FittedEncoder {
    /// Learn fill values and vocabularies from `rows` of `dataset`.
    pub fn fit(
        dataset: &Dataset,
        columns: &[String],
        rows: &[usize],
        config: &FeatureConfig,
    ) -> Result<Self> {
        let mut encoders = Vec::with_capacity(columns.len());
        for name in columns {
            let column = dataset.column(name)?;
            let train = column.data().take(rows);
            let strategy = config.imputation.strategy_for(name);
            if *strategy == ImputeStrategy::Leave {
                return Err(MlError::InvalidConfig(format!(
                    "feature '{name}' cannot keep missing values; impute it or list it in drop_missing"
                )));
            }
            let fill = fit_fill(name, &train, strategy)?;
            let encoder = match column.kind() {
                ColumnKind::Categorical => {
                    let fill = match fill {
                        Some(FillValue::Text(text)) => Some(text),
                        _ => None,
                    };
                    let (filled, _) = match &fill {
                        Some(text) => apply_fill(&train, &FillValue::Text(text.clone())),
                        None => (train, 0),
                    };
                    let vocabulary: Vec<String> = filled.value_counts().into_keys().collect();
                    let one_hot = config.encoding == Encoding::OneHot
                        && vocabulary.len() <= config.max_one_hot_categories;
                    if config.encoding == Encoding::OneHot && !one_hot {
                        debug!(
                            column = %name,
                            categories = vocabulary.len(),
                            "too many categories for one-hot, using ordinal codes"
                        );
                    }
                    if one_hot {
                        FeatureEncoder::OneHot {
                            column: name.clone(),
                            vocabulary,
                            fill,
                        }
                    } else {
                        FeatureEncoder::Ordinal {
                            column: name.clone(),
                            vocabulary,
                            fill,
                        }
                    }
                }
                _ => FeatureEncoder::Numeric {
                    column: name.clone(),
                    fill: fill.map_or(0.0, fill_as_number),
                },
            };
            encoders.push(encoder);
        }
        let feature_names = encoders.iter().flat_map(FeatureEncoder::output_names).collect();
        Ok(Self {
            encoders,
            feature_names,
        })
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn encoders(&self) -> &[FeatureEncoder] {
        &self.encoders
    }

    /// Encode `rows` of `dataset` into a matrix.
    pub fn transform(&self, dataset: &Dataset, rows: &[usize]) -> Result<Matrix> {
        let columns = self
            .encoders
            .iter()
            .map(|e| dataset.column(e.column()).map(Column::data))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let width = self.feature_names.len();
        let mut values = Vec::with_capacity(rows.len() * width);
        for &row in rows {
            for (encoder, data) in self.encoders.iter().zip(&columns) {
                encoder.encode(data, row, &mut values);
            }
        }
        Matrix::new(rows.len(), width, values)
    }
}

fn fill_as_number(fill: FillValue) -> f64 {
    match fill {
        FillValue::Number(v) => v,
        FillValue::Flag(b) => {
            if b {
                1.0
            } else {
                0.0
            }
        }
        FillValue::Date(d) => days_since_epoch(d) as f64,
        FillValue::Text(_) => 0.0,
    }
}

/// Output of [`prepare_features`].
#[derive(Debug, Clone)]
pub struct PreparedData {
    pub task: Task,
    pub target: String,
    pub encoder: FittedEncoder,
    /// Dataset row indices of each split.
    pub train_rows: Vec<usize>,
    pub test_rows: Vec<usize>,
    pub x_train: Matrix,
    pub y_train: Vec<f64>,
    pub x_test: Matrix,
    pub y_test: Vec<f64>,
}

impl PreparedData {
    pub fn feature_names(&self) -> &[String] {
        self.encoder.feature_names()
    }
}

/// Target values by row; classification targets must be flags or 0/1.
fn target_values(dataset: &Dataset, column: &str, task: Task) -> Result<Vec<Option<f64>>> {
    let col = dataset.column(column)?;
    let invalid = |reason: &str| MlError::InvalidTarget {
        column: column.to_string(),
        reason: reason.to_string(),
    };
    let data = col.data();
    let values: Vec<Option<f64>> = (0..data.len()).map(|row| data.numeric_value(row)).collect();
    match (task, col.kind()) {
        (Task::Regression, ColumnKind::Numeric) => Ok(values),
        (Task::Regression, _) => Err(invalid("regression target must be numeric")),
        (Task::Classification, ColumnKind::Boolean) => Ok(values),
        (Task::Classification, ColumnKind::Numeric) => {
            if values.iter().flatten().all(|v| *v == 0.0 || *v == 1.0) {
                Ok(values)
            } else {
                Err(invalid("classification target must contain only 0 and 1"))
            }
        }
        (Task::Classification, _) => Err(invalid("classification target must be boolean or 0/1")),
    }
}

fn select_features(dataset: &Dataset, config: &FeatureConfig) -> Result<Vec<String>> {
    let selected: Vec<String> = match &config.features {
        Some(list) => {
            for name in list {
                dataset.column(name)?;
            }
            list.iter().filter(|n| **n != config.target).cloned().collect()
        }
        None => {
            let ratio_leaks = config.target == fields::TOTAL_PREMIUM
                || config.target == fields::SUM_INSURED;
            dataset
                .column_names()
                .into_iter()
                .filter(|n| *n != config.target)
                .filter(|n| !config.exclude.iter().any(|e| e == *n))
                .filter(|n| !(ratio_leaks && *n == fields::PREMIUM_TO_SUM_RATIO))
                .map(str::to_string)
                .collect()
        }
    };
    if selected.is_empty() {
        return Err(MlError::NoFeatures);
    }
    Ok(selected)
}

/// Run the full pipeline over `dataset`.
pub fn prepare_features(dataset: &Dataset, config: &FeatureConfig) -> Result<PreparedData> {
    let start = Instant::now();
    let dataset: Cow<'_, Dataset> = if config.derive_ratio
        && !dataset.has_column(fields::PREMIUM_TO_SUM_RATIO)
    {
        let mut owned = dataset.clone();
        add_premium_ratio(&mut owned)?;
        Cow::Owned(owned)
    } else {
        Cow::Borrowed(dataset)
    };

    let target = target_values(&dataset, &config.target, config.task)?;
    let features = select_features(&dataset, config)?;

    let drop_columns = config
        .drop_missing
        .iter()
        .map(|name| dataset.column(name).map(Column::data))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let usable: Vec<usize> = (0..dataset.height())
        .filter(|&row| target[row].is_some())
        .filter(|&row| drop_columns.iter().all(|data| !data.is_missing(row)))
        .collect();
    let dropped = dataset.height() - usable.len();
    if dropped > 0 {
        debug!(dropped, "rows removed for missing target or dropped fields");
    }

    let split = train_test_split(usable.len(), config.train_ratio, config.seed)?;
    let train_rows: Vec<usize> = split.train.iter().map(|&i| usable[i]).collect();
    let test_rows: Vec<usize> = split.test.iter().map(|&i| usable[i]).collect();

    let encoder = FittedEncoder::fit(&dataset, &features, &train_rows, config)?;
    let x_train = encoder.transform(&dataset, &train_rows)?;
    let x_test = encoder.transform(&dataset, &test_rows)?;
    let y_train: Vec<f64> = train_rows.iter().filter_map(|&r| target[r]).collect();
    let y_test: Vec<f64> = test_rows.iter().filter_map(|&r| target[r]).collect();

    info!(
        target = %config.target,
        rows = usable.len(),
        train = train_rows.len(),
        test = test_rows.len(),
        features = encoder.feature_names().len(),
        duration_ms = start.elapsed().as_millis(),
        "features prepared"
    );
    Ok(PreparedData {
        task: config.task,
        target: config.target.clone(),
        encoder,
        train_rows,
        test_rows,
        x_train,
        y_train,
        x_test,
        y_test,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn portfolio() -> Dataset {
        Dataset::new(vec![
            Column::categorical(
                "Province",
                vec![Some("Gauteng"), Some("Limpopo"), None, Some("Gauteng"), Some("Limpopo"), Some("Gauteng")],
            ),
            Column::numeric("SumInsured", vec![Some(100.0), Some(0.0), Some(50.0), None, Some(10.0), Some(20.0)]),
            Column::numeric("TotalPremium", vec![Some(10.0), Some(5.0), Some(5.0), Some(1.0), Some(2.0), Some(4.0)]),
            Column::numeric("TotalClaims", vec![Some(0.0), Some(30.0), None, Some(0.0), Some(12.0), Some(0.0)]),
            Column::boolean("NewVehicle", vec![Some(true), None, Some(false), Some(false), Some(true), Some(true)]),
            Column::numeric("PolicyID", vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(5.0), Some(6.0)]),
        ])
        .unwrap()
    }

    #[test]
    fn premium_ratio() {
        let mut ds = portfolio();
        assert!(add_premium_ratio(&mut ds).unwrap());
        let ratio = ds.column("PremiumToSumRatio").unwrap().data();
        assert_eq!(ratio.numeric_value(0), Some(0.1));
        assert_eq!(ratio.numeric_value(1), None);
        assert_eq!(ratio.numeric_value(3), None);

        let mut bare = Dataset::new(vec![Column::numeric("x", vec![Some(1.0)])]).unwrap();
        assert!(!add_premium_ratio(&mut bare).unwrap());
    }

    #[test]
    fn default_feature_selection_excludes_leaky_columns() {
        let mut ds = portfolio();
        add_premium_ratio(&mut ds).unwrap();
        let features = select_features(&ds, &FeatureConfig::default()).unwrap();
        assert_eq!(
            features,
            vec!["Province", "SumInsured", "NewVehicle", "PremiumToSumRatio"]
        );

        let config = FeatureConfig {
            target: "TotalPremium".to_string(),
            ..FeatureConfig::default()
        };
        let features = select_features(&ds, &config).unwrap();
        assert!(!features.contains(&"PremiumToSumRatio".to_string()));
    }

    #[test]
    fn pipeline_drops_missing_targets_and_encodes() {
        let config = FeatureConfig {
            train_ratio: 0.6,
            ..FeatureConfig::default()
        };
        let prepared = prepare_features(&portfolio(), &config).unwrap();
        assert_eq!(prepared.train_rows.len() + prepared.test_rows.len(), 5);
        assert!(!prepared.train_rows.contains(&2));
        assert!(!prepared.test_rows.contains(&2));
        assert_eq!(prepared.train_rows.len(), 3);
        assert_eq!(prepared.x_train.n_rows(), 3);
        assert_eq!(prepared.y_test.len(), prepared.test_rows.len());
        assert_eq!(prepared.x_train.n_cols(), prepared.feature_names().len());
        assert!(prepared.feature_names().iter().any(|n| n == "Province=<unknown>"));
        prepared.x_train.check_finite().unwrap();
        prepared.x_test.check_finite().unwrap();
    }

    #[test]
    fn unseen_categories_map_to_unknown() {
        let ds = portfolio();
        let config = FeatureConfig {
            features: Some(vec!["Province".to_string()]),
            ..FeatureConfig::default()
        };
        // Fit on Gauteng rows only.
        let encoder = FittedEncoder::fit(&ds, &["Province".to_string()], &[0, 3], &config).unwrap();
        assert_eq!(
            encoder.feature_names(),
            &["Province=Gauteng".to_string(), "Province=<unknown>".to_string()]
        );
        let m = encoder.transform(&ds, &[0, 1, 2]).unwrap();
        assert_eq!(m.row(0), &[1.0, 0.0]);
        assert_eq!(m.row(1), &[0.0, 1.0]);
        // Missing filled with the training mode.
        assert_eq!(m.row(2), &[1.0, 0.0]);

        let ordinal = FeatureConfig {
            encoding: Encoding::Ordinal,
            ..config
        };
        let encoder = FittedEncoder::fit(&ds, &["Province".to_string()], &[0, 1], &ordinal).unwrap();
        let m = encoder.transform(&ds, &[0, 1, 3]).unwrap();
        assert_eq!(m.column(0), vec![1.0, 2.0, 1.0]);
    }

    #[test]
    fn one_hot_falls_back_to_ordinal() {
        let ds = portfolio();
        let config = FeatureConfig {
            max_one_hot_categories: 1,
            ..FeatureConfig::default()
        };
        let encoder =
            FittedEncoder::fit(&ds, &["Province".to_string()], &[0, 1, 3, 4], &config).unwrap();
        assert!(matches!(encoder.encoders()[0], FeatureEncoder::Ordinal { .. }));
    }

    #[test]
    fn encoding_is_deterministic() {
        let ds = portfolio();
        let config = FeatureConfig::default();
        let cols = vec!["Province".to_string(), "NewVehicle".to_string()];
        let a = FittedEncoder::fit(&ds, &cols, &[0, 1, 3], &config).unwrap();
        let b = FittedEncoder::fit(&ds, &cols, &[0, 1, 3], &config).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            a.transform(&ds, &[0, 1, 2, 3, 4, 5]).unwrap(),
            a.transform(&ds, &[0, 1, 2, 3, 4, 5]).unwrap()
        );
    }

    #[test]
    fn target_validation() {
        let ds = portfolio();
        let config = FeatureConfig {
            target: "Province".to_string(),
            ..FeatureConfig::default()
        };
        assert!(matches!(
            prepare_features(&ds, &config),
            Err(MlError::InvalidTarget { .. })
        ));
        let config = FeatureConfig {
            target: "TotalClaims".to_string(),
            task: Task::Classification,
            ..FeatureConfig::default()
        };
        assert!(matches!(
            prepare_features(&ds, &config),
            Err(MlError::InvalidTarget { .. })
        ));
        let config = FeatureConfig {
            target: "NewVehicle".to_string(),
            task: Task::Classification,
            ..FeatureConfig::default()
        };
        let prepared = prepare_features(&ds, &config).unwrap();
        assert_eq!(prepared.train_rows.len() + prepared.test_rows.len(), 5);
    }

    #[test]
    fn leave_strategy_is_rejected_for_features() {
        let mut config = FeatureConfig::default();
        config
            .imputation
            .overrides
            .insert("Province".to_string(), ImputeStrategy::Leave);
        assert!(matches!(
            prepare_features(&portfolio(), &config),
            Err(MlError::InvalidConfig(_))
        ));
    }
}
