//! Analysis settings loaded from an optional TOML file.
//!
//! Every section is optional; absent keys take the library defaults.
//!
//! ```toml
//! significance = 0.01
//! continuous_test = "welch"
//! output_dir = "reports"
//!
//! [load]
//! delimiter = "|"
//!
//! [labels.gender_risk]
//! control = "Female"
//! test = "Male"
//!
//! [features]
//! target = "TotalPremium"
//! encoding = "ordinal"
//!
//! [params]
//! n_trees = 200
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use claims_ingest::LoadOptions;
use claims_ml::{FeatureConfig, ImportanceConfig, ModelKind, ModelParams};
use claims_model::DEFAULT_SIGNIFICANCE;
use claims_quality::ImputationPolicy;
use claims_stats::{ContinuousTest, HypothesisRunner, LabelPair};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub load: LoadOptions,
    /// Impute missing values right after loading.
    pub impute: bool,
    pub imputation: ImputationPolicy,
    pub significance: f64,
    pub continuous_test: ContinuousTest,
    /// Label overrides keyed by standard hypothesis (`province_risk`,
    /// `zip_code_risk`, `zip_code_margin`, `gender_risk`).
    pub labels: BTreeMap<String, LabelPair>,
    pub features: FeatureConfig,
    /// Model names; empty means every kind.
    pub models: Vec<String>,
    pub params: ModelParams,
    pub importance: ImportanceConfig,
    /// Default directory for reports and exports.
    pub output_dir: PathBuf,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            load: LoadOptions::default(),
            impute: false,
            imputation: ImputationPolicy::default(),
            significance: DEFAULT_SIGNIFICANCE,
            continuous_test: ContinuousTest::default(),
            labels: BTreeMap::new(),
            features: FeatureConfig::default(),
            models: Vec::new(),
            params: ModelParams::default(),
            importance: ImportanceConfig::default(),
            output_dir: PathBuf::from("reports"),
        }
    }
}

impl AnalysisConfig {
    /// Read `path`, or return the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let config = Self::from_toml(&contents)
            .with_context(|| format!("parse config {}", path.display()))?;
        info!(path = %path.display(), "analysis config loaded");
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.runner()?;
        config.model_kinds()?;
        Ok(config)
    }

    /// Hypothesis runner with the configured significance and test.
    pub fn runner(&self) -> Result<HypothesisRunner> {
        Ok(HypothesisRunner::new(self.significance)?.with_continuous_test(self.continuous_test))
    }

    /// Configured model kinds, or every kind when none is listed.
    pub fn model_kinds(&self) -> Result<Vec<ModelKind>> {
        parse_model_kinds(&self.models)
    }
}

/// Parse model names, rejecting unknown ones; an empty list means all kinds.
pub fn parse_model_kinds(names: &[String]) -> Result<Vec<ModelKind>> {
    if names.is_empty() {
        return Ok(ModelKind::ALL.to_vec());
    }
    let mut kinds = Vec::with_capacity(names.len());
    for name in names {
        let Some(kind) = ModelKind::parse(name) else {
            bail!("unknown model '{name}'");
        };
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }
    Ok(kinds)
}
