//! A/B hypothesis testing over claims data.
//!
//! Records are split into control and test [`Group`](claims_model::Group)s by
//! [`segment`], then compared on an [`OutcomeMetric`] by a
//! [`HypothesisRunner`]. The metric's kind picks the test: chi-squared for
//! categorical outcomes, Welch t (or z) for continuous ones.
//!
//! # Example
//!
//! ```ignore
//! use claims_stats::{HypothesisRunner, OutcomeMetric, segment};
//!
//! let seg = segment(&dataset, "Gender", "Female", "Male")?;
//! let result = HypothesisRunner::default().run(
//!     &dataset,
//!     "gender risk parity",
//!     &seg,
//!     &OutcomeMetric::claim_frequency(),
//! )?;
//! println!("{}", result.conclusion());
//! ```

mod error;
pub mod hypotheses;
pub mod metric;
pub mod procedures;
pub mod runner;
pub mod segment;

pub use error::{Result, StatsError};
pub use hypotheses::{LabelPair, StandardHypothesis, run_standard_hypotheses};
pub use metric::OutcomeMetric;
pub use procedures::Outcome;
pub use runner::{ContinuousTest, EquivalenceReport, HypothesisRunner};
pub use segment::{default_labels, partition_all, segment, top_labels};
