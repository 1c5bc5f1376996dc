//! Plain-text hypothesis reports, one file per test.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use claims_model::TestResult;
use tracing::info;

/// Provenance printed in every report header.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportContext {
    pub generated_at: NaiveDateTime,
    pub source: Option<String>,
    /// SHA-256 of the input file.
    pub fingerprint: Option<String>,
}

impl ReportContext {
    pub fn now(source: Option<&Path>, fingerprint: Option<String>) -> Self {
        Self {
            generated_at: Local::now().naive_local(),
            source: source.map(|p| p.display().to_string()),
            fingerprint,
        }
    }
}

/// `<name>_results_<YYYYMMDD_HHMMSS>.txt`, with `name` reduced to lower-case
/// letters, digits and underscores.
pub fn report_file_name(name: &str, at: NaiveDateTime) -> String {
    let mut slug = String::with_capacity(name.len());
    for ch in name.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }
    let slug = slug.trim_matches('_');
    let slug = if slug.is_empty() { "hypothesis" } else { slug };
    format!("{slug}_results_{}.txt", at.format("%Y%m%d_%H%M%S"))
}

fn number(value: f64) -> String {
    if value.is_nan() {
        "n/a".to_string()
    } else {
        format!("{value:.4}")
    }
}

fn optional(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), number)
}

/// Render the report body.
pub fn render_test_report(result: &TestResult, context: &ReportContext) -> String {
    let mut lines = vec![
        "Hypothesis Test Report".to_string(),
        "======================".to_string(),
        format!("Null hypothesis:    {}", result.hypothesis),
        format!("Segment field:      {}", result.field),
        format!("Outcome metric:     {}", result.metric),
        format!("Test:               {}", result.kind),
        format!(
            "Generated:          {}",
            context.generated_at.format("%Y-%m-%d %H:%M:%S")
        ),
    ];
    if let Some(source) = &context.source {
        lines.push(format!("Source:             {source}"));
    }
    if let Some(fingerprint) = &context.fingerprint {
        lines.push(format!("Source SHA-256:     {fingerprint}"));
    }

    lines.extend([String::new(), "Groups".to_string(), "------".to_string()]);
    for group in &result.groups {
        lines.push(format!(
            "{}: n = {}, mean = {}, std = {}",
            group.label,
            group.count,
            optional(group.mean),
            optional(group.std_dev)
        ));
    }

    lines.extend([
        String::new(),
        "Results".to_string(),
        "-------".to_string(),
        format!("Statistic:          {}", number(result.statistic)),
        format!("p-value:            {}", number(result.p_value)),
        format!("Degrees of freedom: {}", optional(result.degrees_of_freedom)),
    ]);
    if let Some(df) = result.denominator_df {
        lines.push(format!("Denominator df:     {}", number(df)));
    }
    lines.extend([
        format!("Significance level: {}", result.alpha),
        format!("Decision:           {}", result.decision),
        String::new(),
        result.conclusion(),
    ]);
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Write the report for `result` into `dir` and return its path.
pub fn write_test_report(
    dir: &Path,
    name: &str,
    result: &TestResult,
    context: &ReportContext,
) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    let path = dir.join(report_file_name(name, context.generated_at));
    fs::write(&path, render_test_report(result, context))
        .with_context(|| format!("write {}", path.display()))?;
    info!(path = %path.display(), decision = %result.decision, "test report written");
    Ok(path)
}
