//! Core data model for insurance claims analytics.
//!
//! - [`column`]: typed column storage ([`ColumnData`] tagged union)
//! - [`dataset`]: [`Dataset`], an ordered set of equally long columns
//! - [`group`]: control/test [`Group`]s produced by segmentation
//! - [`testing`]: [`TestResult`] and the decision rule
//! - [`metrics`]: model evaluation metrics and feature importances

pub mod column;
pub mod dataset;
pub mod error;
pub mod group;
pub mod metrics;
pub mod testing;

pub use column::{Column, ColumnData, ColumnKind, date_from_epoch_days, days_since_epoch};
pub use dataset::Dataset;
pub use error::{DataError, Result};
pub use group::{Group, Segmentation};
pub use metrics::{
    ClassificationMetrics, ConfusionMatrix, FeatureImportance, ModelMetrics, RegressionMetrics,
    rank_importances,
};
pub use testing::{
    DEFAULT_SIGNIFICANCE, Decision, MetricKind, SampleSummary, TestKind, TestResult,
};

/// Column names of the claims extract.
pub mod fields {
    pub const TOTAL_PREMIUM: &str = "TotalPremium";
    pub const TOTAL_CLAIMS: &str = "TotalClaims";
    pub const PROVINCE: &str = "Province";
    pub const POSTAL_CODE: &str = "PostalCode";
    pub const GENDER: &str = "Gender";
    pub const SUM_INSURED: &str = "SumInsured";
    pub const TRANSACTION_MONTH: &str = "TransactionMonth";
    pub const VEHICLE_INTRO_DATE: &str = "VehicleIntroDate";
    pub const UNDERWRITTEN_COVER_ID: &str = "UnderwrittenCoverID";
    pub const POLICY_ID: &str = "PolicyID";

    /// `TotalPremium - TotalClaims`.
    pub const MARGIN: &str = "Margin";
    /// `TotalClaims > 0`.
    pub const HAS_CLAIM: &str = "HasClaim";
    /// `TotalPremium / SumInsured`.
    pub const PREMIUM_TO_SUM_RATIO: &str = "PremiumToSumRatio";

    /// Columns every input must carry.
    pub const REQUIRED: &[&str] = &[TOTAL_PREMIUM, TOTAL_CLAIMS, PROVINCE, POSTAL_CODE, GENDER];
}
