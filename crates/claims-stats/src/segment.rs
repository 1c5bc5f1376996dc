//! Partitioning records into comparison groups.

use std::collections::BTreeMap;

use claims_model::{Dataset, Group, Segmentation};
use tracing::debug;

use crate::error::{Result, StatsError};

/// Split `dataset` into control and test groups by equality on `field`.
///
/// Rows whose value is missing or matches neither label belong to neither
/// group. Fails when the labels are equal, the field does not exist, or either
/// group comes out empty.
pub fn segment(dataset: &Dataset, field: &str, control: &str, test: &str) -> Result<Segmentation> {
    if control == test {
        return Err(StatsError::SameLabels {
            field: field.to_string(),
            label: control.to_string(),
        });
    }
    let data = dataset.column(field)?.data();

    let mut control_rows = Vec::new();
    let mut test_rows = Vec::new();
    for row in 0..dataset.height() {
        match data.label(row).as_deref() {
            Some(label) if label == control => control_rows.push(row),
            Some(label) if label == test => test_rows.push(row),
            _ => {}
        }
    }

    for (label, rows) in [(control, &control_rows), (test, &test_rows)] {
        if rows.is_empty() {
            return Err(StatsError::EmptyGroup {
                field: field.to_string(),
                label: label.to_string(),
            });
        }
    }

    debug!(
        field,
        control,
        test,
        control_rows = control_rows.len(),
        test_rows = test_rows.len(),
        "segmented dataset"
    );
    Ok(Segmentation {
        control: Group::new(field, control, control_rows),
        test: Group::new(field, test, test_rows),
    })
}

/// One group per distinct non-missing value of `field`, sorted by label.
pub fn partition_all(dataset: &Dataset, field: &str) -> Result<Vec<Group>> {
    let data = dataset.column(field)?.data();
    let mut buckets: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for row in 0..dataset.height() {
        if let Some(label) = data.label(row) {
            buckets.entry(label).or_default().push(row);
        }
    }
    Ok(buckets
        .into_iter()
        .map(|(label, rows)| Group::new(field, label, rows))
        .collect())
}

/// The `n` most frequent labels of `field`, ties broken by label.
pub fn top_labels(dataset: &Dataset, field: &str, n: usize) -> Result<Vec<String>> {
    let counts = dataset.column(field)?.data().value_counts();
    let mut items: Vec<(String, usize)> = counts.into_iter().collect();
    items.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    Ok(items.into_iter().take(n).map(|(label, _)| label).collect())
}

/// Control and test labels: the configured pair, or the two most frequent
/// values of the field.
pub fn default_labels(dataset: &Dataset, field: &str) -> Result<(String, String)> {
    let labels = top_labels(dataset, field, 2)?;
    match <[String; 2]>::try_from(labels) {
        Ok([control, test]) => Ok((control, test)),
        Err(labels) => Err(StatsError::TooFewLabels {
            field: field.to_string(),
            found: labels.len(),
            needed: 2,
        }),
    }
}
