//! Hypothesis test outcomes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Significance threshold used when none is configured.
pub const DEFAULT_SIGNIFICANCE: f64 = 0.05;

/// Kind of outcome metric; selects the family of test applied to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Discrete outcome compared through a contingency table.
    Categorical,
    /// Real-valued outcome compared through group means.
    Continuous,
}

/// Statistical test that produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestKind {
    ChiSquared,
    WelchT,
    ZTest,
    Anova,
}

impl TestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ChiSquared => "chi-squared",
            Self::WelchT => "Welch t-test",
            Self::ZTest => "z-test",
            Self::Anova => "one-way ANOVA",
        }
    }
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Reject,
    FailToReject,
    /// The statistic could not be computed for this data.
    Undefined,
}

impl Decision {
    /// Reject when `p_value < alpha`; NaN p-values are undefined.
    pub fn from_p_value(p_value: f64, alpha: f64) -> Self {
        if p_value.is_nan() {
            Self::Undefined
        } else if p_value < alpha {
            Self::Reject
        } else {
            Self::FailToReject
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reject => "reject",
            Self::FailToReject => "fail to reject",
            Self::Undefined => "undefined",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-group description of the outcome metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleSummary {
    pub label: String,
    /// Rows with a non-missing outcome.
    pub count: usize,
    /// Mean outcome; for boolean outcomes the share of `true`.
    pub mean: Option<f64>,
    pub std_dev: Option<f64>,
}

/// Outcome of one hypothesis test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub hypothesis: String,
    pub field: String,
    pub metric: String,
    pub kind: TestKind,
    pub statistic: f64,
    pub p_value: f64,
    pub degrees_of_freedom: Option<f64>,
    /// Denominator degrees of freedom of an F test.
    pub denominator_df: Option<f64>,
    pub alpha: f64,
    pub decision: Decision,
    pub groups: Vec<SampleSummary>,
    /// Why the decision is undefined.
    pub reason: Option<String>,
}

impl TestResult {
    pub fn is_rejected(&self) -> bool {
        self.decision == Decision::Reject
    }

    /// One-line conclusion in the wording used by the text reports.
    pub fn conclusion(&self) -> String {
        match self.decision {
            Decision::Reject => format!(
                "Reject the null hypothesis: {} differs across {} (p = {:.4} < {}).",
                self.metric, self.field, self.p_value, self.alpha
            ),
            Decision::FailToReject => format!(
                "Fail to reject the null hypothesis: no significant difference in {} across {} (p = {:.4} >= {}).",
                self.metric, self.field, self.p_value, self.alpha
            ),
            Decision::Undefined => format!(
                "Test undefined: {}.",
                self.reason.as_deref().unwrap_or("statistic could not be computed")
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_rule() {
        assert_eq!(Decision::from_p_value(0.01, 0.05), Decision::Reject);
        assert_eq!(Decision::from_p_value(0.05, 0.05), Decision::FailToReject);
        assert_eq!(Decision::from_p_value(0.8, 0.05), Decision::FailToReject);
        assert_eq!(Decision::from_p_value(f64::NAN, 0.05), Decision::Undefined);
    }

    #[test]
    fn serializes_snake_case() {
        let json = serde_json::to_string(&Decision::FailToReject).unwrap();
        assert_eq!(json, "\"fail_to_reject\"");
        let json = serde_json::to_string(&TestKind::WelchT).unwrap();
        assert_eq!(json, "\"welch_t\"");
    }
}
