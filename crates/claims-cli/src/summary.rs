use std::path::PathBuf;

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use claims_ml::ModelReport;
use claims_model::{Decision, FeatureImportance, ModelMetrics, Segmentation, TestResult};
use claims_quality::{
    GroupStats, KpiDetail, KpiProfile, MissingCount, NumericSummary, OutlierSummary,
};
use claims_stats::EquivalenceReport;

use claims_cli::pipeline::Loaded;

/// Rows shown per importance table.
const TOP_FEATURES: usize = 10;

pub fn print_load_summary(loaded: &Loaded) {
    println!(
        "Loaded {} rows x {} columns (sha256 {})",
        loaded.dataset.height(),
        loaded.dataset.width(),
        loaded.fingerprint
    );
    if !loaded.dropped_columns.is_empty() {
        println!("Dropped empty columns: {}", loaded.dropped_columns.join(", "));
    }
    for imputed in loaded.imputed.iter().filter(|i| i.filled > 0) {
        println!(
            "Imputed {} cells in {} ({})",
            imputed.filled, imputed.column, imputed.strategy
        );
    }
}

pub fn print_written(paths: &[PathBuf]) {
    for path in paths {
        println!("Wrote {}", path.display());
    }
}

pub fn print_missing(missing: &[MissingCount]) {
    if missing.is_empty() {
        println!("No missing values.");
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Column"),
        header_cell("Missing"),
        header_cell("Percent"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    for item in missing {
        let percent = Cell::new(format!("{:.2}%", item.percent));
        let percent = if item.percent >= 50.0 {
            percent.fg(Color::Red).add_attribute(Attribute::Bold)
        } else {
            percent
        };
        table.add_row(vec![Cell::new(&item.column), Cell::new(item.missing), percent]);
    }
    println!();
    println!("Missing values:");
    println!("{table}");
}

pub fn print_describe(summaries: &[NumericSummary]) {
    if summaries.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(
        ["Column", "Count", "Mean", "Std", "Min", "25%", "50%", "75%", "Max"]
            .into_iter()
            .map(header_cell)
            .collect::<Vec<_>>(),
    );
    apply_summary_table_style(&mut table);
    for index in 1..9 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for s in summaries {
        table.add_row(vec![
            Cell::new(&s.column),
            Cell::new(s.count),
            number_cell(s.mean),
            number_cell(s.std),
            number_cell(s.min),
            number_cell(s.q25),
            number_cell(s.median),
            number_cell(s.q75),
            number_cell(s.max),
        ]);
    }
    println!();
    println!("Descriptive statistics:");
    println!("{table}");
}

pub fn print_outliers(outliers: &[OutlierSummary]) {
    if outliers.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Column"),
        header_cell("Q1"),
        header_cell("Q3"),
        header_cell("IQR"),
        header_cell("Lower fence"),
        header_cell("Upper fence"),
        header_cell("Outliers"),
    ]);
    apply_table_style(&mut table);
    for index in 1..7 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for o in outliers {
        table.add_row(vec![
            Cell::new(&o.column),
            number_cell(o.q1),
            number_cell(o.q3),
            number_cell(o.iqr),
            number_cell(o.lower_fence),
            number_cell(o.upper_fence),
            count_cell(o.outliers, Color::Yellow),
        ]);
    }
    println!();
    println!("Outliers (1.5 x IQR):");
    println!("{table}");
}

pub fn print_kpi(profile: &KpiProfile, top: usize) {
    println!();
    println!(
        "KPI {}: {} observations, {} missing, {} unique",
        profile.column, profile.observations, profile.missing, profile.unique
    );
    match &profile.detail {
        KpiDetail::Numeric(summary) => print_describe(std::slice::from_ref(summary)),
        KpiDetail::Categorical { counts } => {
            let mut table = Table::new();
            table.set_header(vec![header_cell("Value"), header_cell("Count")]);
            apply_table_style(&mut table);
            align_column(&mut table, 1, CellAlignment::Right);
            for (label, count) in counts.iter().take(top) {
                table.add_row(vec![Cell::new(label), Cell::new(count)]);
            }
            println!("{table}");
        }
    }
}

pub fn print_groups(field: &str, value: &str, groups: &[GroupStats]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell(field),
        header_cell("Count"),
        header_cell("Mean"),
        header_cell("Median"),
        header_cell("Std"),
        header_cell("Sum"),
    ]);
    apply_table_style(&mut table);
    for index in 1..6 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for g in groups {
        table.add_row(vec![
            Cell::new(&g.group),
            Cell::new(g.count),
            number_cell(g.mean),
            number_cell(g.median),
            number_cell(g.std),
            number_cell(g.sum),
        ]);
    }
    println!();
    println!("{value} by {field}:");
    println!("{table}");
}

pub fn print_segmentation(segmentation: &Segmentation) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Arm"),
        header_cell(segmentation.field()),
        header_cell("Records"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    for (arm, group) in [("control", &segmentation.control), ("test", &segmentation.test)] {
        table.add_row(vec![
            Cell::new(arm).add_attribute(Attribute::Bold),
            Cell::new(&group.label),
            Cell::new(group.len()),
        ]);
    }
    println!("{table}");
}

pub fn print_equivalence(report: &EquivalenceReport) {
    if !report.missing_columns.is_empty() {
        println!(
            "Covariates not in dataset: {}",
            report.missing_columns.join(", ")
        );
    }
    if report.results.is_empty() {
        return;
    }
    print_test_results(&report.results);
    if report.equivalent {
        println!("Groups are equivalent on every checked covariate.");
    } else {
        println!("Groups differ on at least one covariate; results may be confounded.");
    }
}

pub fn print_test_results(results: &[TestResult]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Hypothesis"),
        header_cell("Groups"),
        header_cell("Test"),
        header_cell("Statistic"),
        header_cell("p-value"),
        header_cell("Decision"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 3, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Right);
    align_column(&mut table, 5, CellAlignment::Center);
    for result in results {
        let groups = result
            .groups
            .iter()
            .map(|g| g.label.as_str())
            .collect::<Vec<_>>()
            .join(" vs ");
        table.add_row(vec![
            Cell::new(&result.hypothesis),
            Cell::new(groups),
            Cell::new(result.kind),
            number_cell(result.statistic),
            p_value_cell(result.p_value),
            decision_cell(result.decision),
        ]);
    }
    println!();
    println!("{table}");
    for result in results {
        println!("- {}", result.conclusion());
    }
}

pub fn print_model_reports(reports: &[ModelReport]) {
    let Some(first) = reports.first() else {
        return;
    };
    let regression = matches!(first.metrics, ModelMetrics::Regression(_));
    let mut table = Table::new();
    let metric_headers = if regression {
        ["MAE", "RMSE", "R2", "Train R2"]
    } else {
        ["Accuracy", "Precision", "Recall", "F1"]
    };
    let mut header = vec![header_cell("Rank"), header_cell("Model")];
    header.extend(metric_headers.into_iter().map(header_cell));
    header.push(header_cell("Time (ms)"));
    table.set_header(header);
    apply_summary_table_style(&mut table);
    for index in 0..7 {
        if index != 1 {
            align_column(&mut table, index, CellAlignment::Right);
        }
    }
    for (rank, report) in reports.iter().enumerate() {
        let model = Cell::new(report.model);
        let model = if rank == 0 {
            model.fg(Color::Green).add_attribute(Attribute::Bold)
        } else {
            model
        };
        let mut row = vec![Cell::new(rank + 1), model];
        match (report.metrics, report.train_metrics) {
            (ModelMetrics::Regression(test), ModelMetrics::Regression(train)) => {
                row.extend([
                    number_cell(test.mae),
                    number_cell(test.rmse),
                    number_cell(test.r2),
                    number_cell(train.r2),
                ]);
            }
            (ModelMetrics::Classification(test), _) => {
                row.extend([
                    number_cell(test.accuracy),
                    number_cell(test.precision),
                    number_cell(test.recall),
                    number_cell(test.f1),
                ]);
            }
            (ModelMetrics::Regression(test), _) => {
                row.extend([
                    number_cell(test.mae),
                    number_cell(test.rmse),
                    number_cell(test.r2),
                    dim_cell("-"),
                ]);
            }
        }
        row.push(dim_cell(report.duration_ms));
        table.add_row(row);
    }
    println!();
    println!("Model comparison (test split):");
    println!("{table}");
}

/// Side-by-side top features of one model by each importance method.
pub fn print_importances(report: &ModelReport) {
    let columns: Vec<(&str, &[FeatureImportance])> = [
        ("Impurity", report.impurity_importances.as_slice()),
        ("Permutation", report.permutation_importances.as_slice()),
        ("Shapley", report.shapley_importances.as_slice()),
    ]
    .into_iter()
    .filter(|(_, list)| !list.is_empty())
    .collect();
    if columns.is_empty() {
        return;
    }
    let mut table = Table::new();
    let mut header = vec![header_cell("#")];
    header.extend(columns.iter().map(|(name, _)| header_cell(name)));
    table.set_header(header);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    let rows = columns.iter().map(|(_, list)| list.len()).max().unwrap_or(0);
    for rank in 0..rows.min(TOP_FEATURES) {
        let mut row = vec![dim_cell(rank + 1)];
        for (_, list) in &columns {
            row.push(match list.get(rank) {
                Some(item) => Cell::new(format!("{} ({})", item.feature, format_number(item.importance))),
                None => dim_cell("-"),
            });
        }
        table.add_row(row);
    }
    println!();
    println!("Feature importance ({}):", report.model);
    println!("{table}");
}

fn format_number(value: f64) -> String {
    if value.is_nan() {
        "-".to_string()
    } else if value != 0.0 && (value.abs() >= 1e7 || value.abs() < 1e-3) {
        format!("{value:.3e}")
    } else {
        format!("{value:.4}")
    }
}

fn number_cell(value: f64) -> Cell {
    if value.is_nan() {
        dim_cell("-")
    } else {
        Cell::new(format_number(value))
    }
}

fn p_value_cell(p_value: f64) -> Cell {
    if p_value.is_nan() {
        dim_cell("-")
    } else if p_value < 1e-4 {
        Cell::new("< 0.0001")
    } else {
        Cell::new(format!("{p_value:.4}"))
    }
}

fn decision_cell(decision: Decision) -> Cell {
    let cell = Cell::new(decision);
    match decision {
        Decision::Reject => cell.fg(Color::Red).add_attribute(Attribute::Bold),
        Decision::FailToReject => cell.fg(Color::Green),
        Decision::Undefined => cell.fg(Color::Yellow),
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(140);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_switch_to_scientific_at_extremes() {
        assert_eq!(format_number(12.5), "12.5000");
        assert_eq!(format_number(0.0), "0.0000");
        assert_eq!(format_number(0.00001), "1.000e-5");
        assert_eq!(format_number(f64::NAN), "-");
    }
}
