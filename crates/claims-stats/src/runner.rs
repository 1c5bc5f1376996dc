//! Test selection and decisions.

use std::collections::BTreeSet;

use claims_common::stats::{mean, sample_std};
use claims_model::{
    ColumnData, ColumnKind, DEFAULT_SIGNIFICANCE, DataError, Dataset, Decision, Group, MetricKind,
    SampleSummary, Segmentation, TestKind, TestResult,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, StatsError};
use crate::metric::OutcomeMetric;
use crate::procedures::{Outcome, chi_squared, one_way_anova, welch_t, z_test};
use crate::segment::partition_all;

/// Test used for continuous outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContinuousTest {
    #[default]
    Welch,
    Z,
}

impl ContinuousTest {
    fn kind(self) -> TestKind {
        match self {
            Self::Welch => TestKind::WelchT,
            Self::Z => TestKind::ZTest,
        }
    }
}

/// Runs hypothesis tests at a fixed significance level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HypothesisRunner {
    alpha: f64,
    continuous_test: ContinuousTest,
}

impl Default for HypothesisRunner {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_SIGNIFICANCE,
            continuous_test: ContinuousTest::default(),
        }
    }
}

/// Covariate balance between the two arms of a segmentation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquivalenceReport {
    pub results: Vec<TestResult>,
    /// Requested covariates absent from the dataset.
    pub missing_columns: Vec<String>,
    /// True when no covariate differs significantly.
    pub equivalent: bool,
}

impl HypothesisRunner {
    pub fn new(alpha: f64) -> Result<Self> {
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(StatsError::InvalidSignificance(alpha));
        }
        Ok(Self {
            alpha,
            ..Self::default()
        })
    }

    pub fn with_continuous_test(mut self, test: ContinuousTest) -> Self {
        self.continuous_test = test;
        self
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn continuous_test(&self) -> ContinuousTest {
        self.continuous_test
    }

    /// Compare `metric` between the control and test arms.
    ///
    /// Categorical metrics get a chi-squared test; continuous metrics get the
    /// configured two-sample test.
    pub fn run(
        &self,
        dataset: &Dataset,
        hypothesis: &str,
        segmentation: &Segmentation,
        metric: &OutcomeMetric,
    ) -> Result<TestResult> {
        let data = dataset.column(&metric.column)?.data();
        let groups = segmentation.groups();
        let (kind, outcome, summaries) = match metric.kind {
            MetricKind::Categorical => {
                let (outcome, summaries) = categorical_comparison(data, &groups)?;
                (TestKind::ChiSquared, outcome, summaries)
            }
            MetricKind::Continuous => {
                let samples = continuous_samples(&metric.column, data, &groups)?;
                let outcome = match self.continuous_test {
                    ContinuousTest::Welch => welch_t(&samples[0], &samples[1])?,
                    ContinuousTest::Z => z_test(&samples[0], &samples[1])?,
                };
                let summaries = continuous_summaries(&groups, &samples);
                (self.continuous_test.kind(), outcome, summaries)
            }
        };
        let result = self.assemble(
            hypothesis,
            segmentation.field(),
            metric,
            kind,
            outcome,
            summaries,
        );
        info!(
            hypothesis,
            test = %result.kind,
            statistic = result.statistic,
            p_value = result.p_value,
            decision = %result.decision,
            "hypothesis test complete"
        );
        Ok(result)
    }

    /// One-way ANOVA of a continuous metric across every value of `field`.
    pub fn run_anova(
        &self,
        dataset: &Dataset,
        hypothesis: &str,
        field: &str,
        metric: &OutcomeMetric,
    ) -> Result<TestResult> {
        let data = dataset.column(&metric.column)?.data();
        let groups = partition_all(dataset, field)?;
        let group_refs: Vec<&Group> = groups.iter().collect();
        let samples = continuous_samples(&metric.column, data, &group_refs)?;
        let outcome = one_way_anova(&samples)?;
        let summaries = continuous_summaries(&group_refs, &samples);
        let result = self.assemble(hypothesis, field, metric, TestKind::Anova, outcome, summaries);
        info!(
            hypothesis,
            groups = groups.len(),
            statistic = result.statistic,
            p_value = result.p_value,
            decision = %result.decision,
            "ANOVA complete"
        );
        Ok(result)
    }

    /// Test each covariate between the arms; the arms are equivalent when none
    /// differs. Missing covariates are reported, not fatal.
    pub fn check_equivalence(
        &self,
        dataset: &Dataset,
        segmentation: &Segmentation,
        columns: &[String],
    ) -> Result<EquivalenceReport> {
        let mut results = Vec::new();
        let mut missing_columns = Vec::new();
        for column in columns {
            if column == segmentation.field() {
                debug!(column = %column, "skipping partition field in equivalence check");
                continue;
            }
            if !dataset.has_column(column) {
                missing_columns.push(column.clone());
                continue;
            }
            let metric = OutcomeMetric::for_column(dataset, column)?;
            let hypothesis = format!("equivalence of {column}");
            results.push(self.run(dataset, &hypothesis, segmentation, &metric)?);
        }
        let equivalent = !results.iter().any(TestResult::is_rejected);
        Ok(EquivalenceReport {
            results,
            missing_columns,
            equivalent,
        })
    }

    fn assemble(
        &self,
        hypothesis: &str,
        field: &str,
        metric: &OutcomeMetric,
        kind: TestKind,
        outcome: Outcome,
        groups: Vec<SampleSummary>,
    ) -> TestResult {
        let (statistic, p_value, degrees_of_freedom, denominator_df, reason) = match outcome {
            Outcome::Computed {
                statistic,
                p_value,
                df,
                denominator_df,
            } => (statistic, p_value, df, denominator_df, None),
            Outcome::Undefined(reason) => (f64::NAN, f64::NAN, None, None, Some(reason)),
        };
        let decision = if reason.is_some() {
            Decision::Undefined
        } else {
            Decision::from_p_value(p_value, self.alpha)
        };
        TestResult {
            hypothesis: hypothesis.to_string(),
            field: field.to_string(),
            metric: metric.name.clone(),
            kind,
            statistic,
            p_value,
            degrees_of_freedom,
            denominator_df,
            alpha: self.alpha,
            decision,
            groups,
            reason,
        }
    }
}

/// Contingency table of group x outcome category plus per-group summaries.
fn categorical_comparison(
    data: &ColumnData,
    groups: &[&Group],
) -> Result<(Outcome, Vec<SampleSummary>)> {
    let labels: Vec<Vec<String>> = groups
        .iter()
        .map(|g| g.rows.iter().filter_map(|&row| data.label(row)).collect())
        .collect();
    let categories: BTreeSet<&str> = labels.iter().flatten().map(String::as_str).collect();
    let table: Vec<Vec<f64>> = labels
        .iter()
        .map(|group| {
            categories
                .iter()
                .map(|cat| group.iter().filter(|l| l.as_str() == *cat).count() as f64)
                .collect()
        })
        .collect();

    let summaries = groups
        .iter()
        .map(|g| {
            let flags: Vec<f64> = match data {
                ColumnData::Boolean(_) => g
                    .rows
                    .iter()
                    .filter_map(|&row| data.numeric_value(row))
                    .collect(),
                _ => Vec::new(),
            };
            SampleSummary {
                label: g.label.clone(),
                count: g.rows.iter().filter(|&&row| !data.is_missing(row)).count(),
                mean: mean(&flags),
                std_dev: sample_std(&flags),
            }
        })
        .collect();

    Ok((chi_squared(&table)?, summaries))
}

/// Non-missing numeric outcome values per group.
fn continuous_samples(column: &str, data: &ColumnData, groups: &[&Group]) -> Result<Vec<Vec<f64>>> {
    if data.kind() == ColumnKind::Categorical {
        return Err(DataError::KindMismatch {
            column: column.to_string(),
            expected: ColumnKind::Numeric,
            found: ColumnKind::Categorical,
        }
        .into());
    }
    Ok(groups
        .iter()
        .map(|g| {
            g.rows
                .iter()
                .filter_map(|&row| data.numeric_value(row))
                .collect()
        })
        .collect())
}

fn continuous_summaries(groups: &[&Group], samples: &[Vec<f64>]) -> Vec<SampleSummary> {
    groups
        .iter()
        .zip(samples)
        .map(|(g, values)| SampleSummary {
            label: g.label.clone(),
            count: values.len(),
            mean: mean(values),
            std_dev: sample_std(values),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::segment;
    use claims_model::Column;

    fn dataset() -> Dataset {
        Dataset::new(vec![
            Column::categorical(
                "Gender",
                vec![
                    Some("Male"),
                    Some("Male"),
                    Some("Male"),
                    Some("Female"),
                    Some("Female"),
                    Some("Female"),
                ],
            ),
            Column::boolean(
                "HasClaim",
                vec![Some(true), Some(false), Some(false), Some(true), Some(false), None],
            ),
            Column::numeric(
                "Margin",
                vec![Some(10.0), Some(12.0), Some(11.0), Some(50.0), Some(52.0), Some(51.0)],
            ),
            Column::numeric("Flat", vec![Some(1.0); 6]),
        ])
        .unwrap()
    }

    #[test]
    fn rejects_invalid_alpha() {
        assert!(HypothesisRunner::new(0.0).is_err());
        assert!(HypothesisRunner::new(1.5).is_err());
        assert!(HypothesisRunner::new(f64::NAN).is_err());
        assert_eq!(HypothesisRunner::new(0.01).unwrap().alpha(), 0.01);
    }

    #[test]
    fn continuous_metric_uses_welch() {
        let ds = dataset();
        let seg = segment(&ds, "Gender", "Male", "Female").unwrap();
        let result = HypothesisRunner::default()
            .run(&ds, "margin by gender", &seg, &OutcomeMetric::margin())
            .unwrap();
        assert_eq!(result.kind, TestKind::WelchT);
        assert_eq!(result.decision, Decision::Reject);
        assert_eq!(result.groups[0].mean, Some(11.0));
        assert_eq!(result.groups[1].mean, Some(51.0));
    }

    #[test]
    fn z_test_selected_by_configuration() {
        let ds = dataset();
        let seg = segment(&ds, "Gender", "Male", "Female").unwrap();
        let result = HypothesisRunner::default()
            .with_continuous_test(ContinuousTest::Z)
            .run(&ds, "margin by gender", &seg, &OutcomeMetric::margin())
            .unwrap();
        assert_eq!(result.kind, TestKind::ZTest);
        assert_eq!(result.degrees_of_freedom, None);
    }

    #[test]
    fn categorical_metric_uses_chi_squared() {
        let ds = dataset();
        let seg = segment(&ds, "Gender", "Male", "Female").unwrap();
        let result = HypothesisRunner::default()
            .run(&ds, "risk by gender", &seg, &OutcomeMetric::claim_frequency())
            .unwrap();
        assert_eq!(result.kind, TestKind::ChiSquared);
        assert_eq!(result.degrees_of_freedom, Some(1.0));
        assert_eq!(result.groups[1].count, 2);
        assert_eq!(result.groups[1].mean, Some(0.5));
        assert_ne!(result.decision, Decision::Undefined);
    }

    #[test]
    fn zero_variance_is_undefined() {
        let ds = dataset();
        let seg = segment(&ds, "Gender", "Male", "Female").unwrap();
        let metric = OutcomeMetric::for_column(&ds, "Flat").unwrap();
        let result = HypothesisRunner::default()
            .run(&ds, "flat", &seg, &metric)
            .unwrap();
        assert_eq!(result.decision, Decision::Undefined);
        assert!(result.statistic.is_nan());
        assert!(result.p_value.is_nan());
        assert!(result.reason.is_some());
    }

    #[test]
    fn continuous_metric_on_text_column_fails() {
        let ds = dataset();
        let seg = segment(&ds, "Gender", "Male", "Female").unwrap();
        let metric = OutcomeMetric::new("gender", "Gender", MetricKind::Continuous);
        let err = HypothesisRunner::default()
            .run(&ds, "bad", &seg, &metric)
            .unwrap_err();
        assert!(matches!(err, StatsError::Data(DataError::KindMismatch { .. })));
    }

    #[test]
    fn anova_across_all_groups() {
        let ds = dataset();
        let result = HypothesisRunner::default()
            .run_anova(&ds, "margin across genders", "Gender", &OutcomeMetric::margin())
            .unwrap();
        assert_eq!(result.kind, TestKind::Anova);
        assert_eq!(result.groups.len(), 2);
        assert_eq!(result.degrees_of_freedom, Some(1.0));
        assert_eq!(result.denominator_df, Some(4.0));
        assert!(result.is_rejected());
    }

    #[test]
    fn equivalence_reports_missing_covariates() {
        let ds = dataset();
        let seg = segment(&ds, "Gender", "Male", "Female").unwrap();
        let report = HypothesisRunner::default()
            .check_equivalence(
                &ds,
                &seg,
                &["Margin".to_string(), "Gender".to_string(), "Bodytype".to_string()],
            )
            .unwrap();
        assert_eq!(report.results.len(), 1);
        assert_eq!(report.missing_columns, vec!["Bodytype".to_string()]);
        assert!(!report.equivalent);
    }
}
