//! Report outputs for claims analyses.
//!
//! - CSV exports of summaries, test results and model comparisons (Polars)
//! - JSON dumps of full result structures
//! - Plain-text hypothesis reports named `<name>_results_<timestamp>.txt`
//! - SHA-256 fingerprints tying a run to its input file

mod fingerprint;
mod json;
mod tables;
mod text;

pub use fingerprint::file_sha256;
pub use json::write_json;
pub use tables::{
    dataset_frame, describe_frame, group_frame, importance_frame, missing_frame,
    model_comparison_frame, outlier_frame, test_results_frame, write_csv,
};
pub use text::{ReportContext, render_test_report, report_file_name, write_test_report};
