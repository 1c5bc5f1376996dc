//! Shared load step of every analysis command.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use claims_ingest::{LoadOptions, add_derived_columns, load_dataset};
use claims_model::{Dataset, fields};
use claims_quality::{ImputationPolicy, ImputeStrategy, ImputedColumn, impute_missing};
use claims_report::{ReportContext, file_sha256};
use tracing::{info, info_span, warn};

/// A dataset ready for analysis, with what loading changed.
#[derive(Debug, Clone)]
pub struct Loaded {
    pub dataset: Dataset,
    pub dropped_columns: Vec<String>,
    pub coercion_failures: Vec<(String, usize)>,
    pub imputed: Vec<ImputedColumn>,
    /// SHA-256 of the input file.
    pub fingerprint: String,
}

/// Load `path`, fingerprint it and impute when `impute` is set.
///
/// Derived columns are never imputed themselves; they are recomputed from the
/// imputed inputs.
pub fn load(
    path: &Path,
    options: &LoadOptions,
    impute: bool,
    policy: &ImputationPolicy,
) -> Result<Loaded> {
    let span = info_span!("ingest", path = %path.display());
    let _guard = span.enter();
    let start = Instant::now();

    let fingerprint = file_sha256(path)?;
    let loaded = load_dataset(path, options)
        .with_context(|| format!("load {}", path.display()))?;
    let mut dataset = loaded.dataset;
    let imputed = if impute {
        impute_with_derived(&mut dataset, options, policy)?
    } else {
        Vec::new()
    };
    let unparsed: usize = loaded.coercion_failures.iter().map(|(_, n)| n).sum();
    if unparsed > 0 {
        warn!(cells = unparsed, "unparseable values set to missing");
    }
    info!(
        rows = dataset.height(),
        columns = dataset.width(),
        imputed = imputed.len(),
        duration_ms = start.elapsed().as_millis(),
        "ingest complete"
    );
    Ok(Loaded {
        dataset,
        dropped_columns: loaded.dropped_columns,
        coercion_failures: loaded.coercion_failures,
        imputed,
        fingerprint,
    })
}

fn impute_with_derived(
    dataset: &mut Dataset,
    options: &LoadOptions,
    policy: &ImputationPolicy,
) -> Result<Vec<ImputedColumn>> {
    let mut policy = policy.clone();
    for derived in [fields::MARGIN, fields::HAS_CLAIM] {
        policy
            .overrides
            .insert(derived.to_string(), ImputeStrategy::Leave);
    }
    let imputed = impute_missing(dataset, &policy).context("impute missing values")?;
    if options.derive_columns {
        add_derived_columns(dataset).context("recompute derived columns")?;
    }
    Ok(imputed)
}

impl Loaded {
    pub fn report_context(&self, source: &Path) -> ReportContext {
        ReportContext::now(Some(source), Some(self.fingerprint.clone()))
    }
}
