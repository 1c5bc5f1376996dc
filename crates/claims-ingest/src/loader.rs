//! Loading a claims extract into a typed [`Dataset`].

use std::path::Path;
use std::time::Instant;

use claims_model::{Column, Dataset};
use tracing::{debug, info, info_span, warn};

use crate::coerce::{clean_cells, coerce, infer_kind};
use crate::derive::add_derived_columns;
use crate::error::{IngestError, Result};
use crate::options::LoadOptions;
use crate::reader::{column_cells, read_raw_table};

/// A loaded dataset plus what happened while loading it.
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub dataset: Dataset,
    /// Columns removed because every value was missing.
    pub dropped_columns: Vec<String>,
    /// Cells per column that could not be parsed and were set to missing.
    pub coercion_failures: Vec<(String, usize)>,
}

/// Read, type and validate a claims extract.
pub fn load_dataset(path: &Path, options: &LoadOptions) -> Result<LoadedDataset> {
    let span = info_span!("load", path = %path.display());
    let _guard = span.enter();
    let start = Instant::now();

    let delimiter = delimiter_byte(options.delimiter).ok_or_else(|| IngestError::CsvParse {
        path: path.to_path_buf(),
        message: format!("delimiter '{}' is not a single ASCII byte", options.delimiter),
    })?;
    let df = read_raw_table(path, delimiter, options.max_rows)?;

    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.trim().to_string())
        .collect();
    let missing: Vec<String> = options
        .required_columns
        .iter()
        .filter(|required| !names.contains(required))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(IngestError::MissingColumns {
            path: path.to_path_buf(),
            columns: missing,
        });
    }

    let mut columns = Vec::with_capacity(df.width());
    let mut dropped_columns = Vec::new();
    let mut empty_required = Vec::new();
    let mut coercion_failures = Vec::new();
    for (name, raw) in names.iter().zip(df.get_columns()) {
        let cells = clean_cells(column_cells(raw)?.iter().map(Option::as_deref));
        if cells.iter().all(Option::is_none) {
            if options.required_columns.contains(name) {
                empty_required.push(name.clone());
                continue;
            }
            if options.drop_empty_columns {
                warn!(column = %name, "dropping column with no values");
                dropped_columns.push(name.clone());
                continue;
            }
        }
        let kind = options
            .declared_kind(name)
            .unwrap_or_else(|| infer_kind(&cells));
        let coerced = coerce(cells, kind, options.normalize_case);
        if coerced.failures > 0 {
            debug!(
                column = %name,
                kind = %kind,
                failures = coerced.failures,
                "unparseable cells set to missing"
            );
            coercion_failures.push((name.clone(), coerced.failures));
        }
        columns.push(Column::new(name.clone(), coerced.data));
    }

    if !empty_required.is_empty() {
        return Err(IngestError::EmptyRequiredColumns {
            path: path.to_path_buf(),
            columns: empty_required,
        });
    }

    let mut dataset = Dataset::new(columns)?;
    if options.derive_columns {
        add_derived_columns(&mut dataset)?;
    }

    info!(
        rows = dataset.height(),
        columns = dataset.width(),
        dropped = dropped_columns.len(),
        duration_ms = start.elapsed().as_millis(),
        "load complete"
    );
    Ok(LoadedDataset {
        dataset,
        dropped_columns,
        coercion_failures,
    })
}

/// The byte form of a field delimiter. Only ASCII characters are one byte in
/// UTF-8.
pub fn delimiter_byte(delimiter: char) -> Option<u8> {
    if delimiter.is_ascii() {
        u8::try_from(delimiter).ok()
    } else {
        None
    }
}
