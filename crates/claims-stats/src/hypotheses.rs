//! The four risk and margin parity hypotheses.

use std::collections::BTreeMap;

use claims_model::{Dataset, TestResult, fields};
use serde::{Deserialize, Serialize};
use tracing::info_span;

use crate::error::Result;
use crate::metric::OutcomeMetric;
use crate::runner::HypothesisRunner;
use crate::segment::{default_labels, segment};

/// Configured control and test labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelPair {
    pub control: String,
    pub test: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StandardHypothesis {
    /// No risk differences across provinces.
    ProvinceRisk,
    /// No risk differences between zip codes.
    ZipCodeRisk,
    /// No significant margin difference between zip codes.
    ZipCodeMargin,
    /// No significant risk difference between women and men.
    GenderRisk,
}

impl StandardHypothesis {
    pub const ALL: [Self; 4] = [
        Self::ProvinceRisk,
        Self::ZipCodeRisk,
        Self::ZipCodeMargin,
        Self::GenderRisk,
    ];

    /// Identifier used in configuration and report file names.
    pub fn key(&self) -> &'static str {
        match self {
            Self::ProvinceRisk => "province_risk",
            Self::ZipCodeRisk => "zip_code_risk",
            Self::ZipCodeMargin => "zip_code_margin",
            Self::GenderRisk => "gender_risk",
        }
    }

    pub fn null_hypothesis(&self) -> &'static str {
        match self {
            Self::ProvinceRisk => "There are no risk differences across provinces",
            Self::ZipCodeRisk => "There are no risk differences between zip codes",
            Self::ZipCodeMargin => "There is no significant margin (profit) difference between zip codes",
            Self::GenderRisk => "There is no significant risk difference between women and men",
        }
    }

    pub fn field(&self) -> &'static str {
        match self {
            Self::ProvinceRisk => fields::PROVINCE,
            Self::ZipCodeRisk | Self::ZipCodeMargin => fields::POSTAL_CODE,
            Self::GenderRisk => fields::GENDER,
        }
    }

    pub fn metric(&self) -> OutcomeMetric {
        match self {
            Self::ZipCodeMargin => OutcomeMetric::margin(),
            _ => OutcomeMetric::claim_frequency(),
        }
    }

    /// Labels compared when none are configured: Female vs Male for gender,
    /// the two most frequent values otherwise.
    ///
    /// Gender labels are matched case-insensitively against the data; when
    /// either is absent the two most frequent values are used instead.
    pub fn default_labels(&self, dataset: &Dataset) -> Result<LabelPair> {
        if *self == Self::GenderRisk {
            let counts = dataset.column(self.field())?.data().value_counts();
            let find = |wanted: &str| {
                counts
                    .keys()
                    .find(|label| label.eq_ignore_ascii_case(wanted))
                    .cloned()
            };
            if let (Some(control), Some(test)) = (find("Female"), find("Male")) {
                return Ok(LabelPair { control, test });
            }
        }
        let (control, test) = default_labels(dataset, self.field())?;
        Ok(LabelPair { control, test })
    }

    /// Segment and test this hypothesis.
    pub fn run(
        &self,
        dataset: &Dataset,
        runner: &HypothesisRunner,
        labels: Option<&LabelPair>,
    ) -> Result<TestResult> {
        let span = info_span!("hypothesis", name = self.key());
        let _guard = span.enter();
        let labels = match labels {
            Some(pair) => pair.clone(),
            None => self.default_labels(dataset)?,
        };
        let segmentation = segment(dataset, self.field(), &labels.control, &labels.test)?;
        runner.run(dataset, self.null_hypothesis(), &segmentation, &self.metric())
    }
}

/// Run all four standard hypotheses; `overrides` maps a hypothesis key to
/// the labels to compare.
pub fn run_standard_hypotheses(
    dataset: &Dataset,
    runner: &HypothesisRunner,
    overrides: &BTreeMap<String, LabelPair>,
) -> Result<Vec<(StandardHypothesis, TestResult)>> {
    StandardHypothesis::ALL
        .iter()
        .map(|h| Ok((*h, h.run(dataset, runner, overrides.get(h.key()))?)))
        .collect()
}
