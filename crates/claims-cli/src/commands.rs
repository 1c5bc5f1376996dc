use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use polars::prelude::DataFrame;
use tracing::{info, info_span};

use claims_cli::config::{AnalysisConfig, parse_model_kinds};
use claims_cli::pipeline::{Loaded, load};
use claims_ingest::{convert_delimited, delimiter_byte};
use claims_ml::{Task, compare_models_with_progress, prepare_features};
use claims_model::Dataset;
use claims_quality::{describe, detect_outliers, group_summary, kpi_profile, missing_summary};
use claims_report::{
    dataset_frame, describe_frame, group_frame, importance_frame, missing_frame,
    model_comparison_frame, outlier_frame, test_results_frame, write_csv, write_json,
    write_test_report,
};
use claims_stats::{
    ContinuousTest, HypothesisRunner, OutcomeMetric, default_labels, run_standard_hypotheses,
    segment,
};

use crate::cli::{
    AnovaArgs, CleanArgs, ContinuousTestArg, ConvertArgs, HypothesesArgs, InputArgs, ModelArgs,
    SegmentArgs, SplitArgs, SummarizeArgs, TaskArg, TestArgs,
};
use crate::summary::{
    print_describe, print_equivalence, print_groups, print_importances, print_kpi,
    print_load_summary, print_missing, print_model_reports, print_outliers, print_segmentation,
    print_test_results, print_written,
};

pub fn run_convert(args: &ConvertArgs) -> Result<()> {
    let delimiter = delimiter_byte(args.delimiter)
        .with_context(|| format!("delimiter '{}' is not a single ASCII byte", args.delimiter))?;
    let rows = convert_delimited(&args.input, &args.output, delimiter)
        .with_context(|| format!("convert {}", args.input.display()))?;
    println!("Converted {rows} rows to {}", args.output.display());
    Ok(())
}

pub fn run_clean(args: &CleanArgs, config: &AnalysisConfig) -> Result<()> {
    let loaded = load_input(&args.input, config)?;
    print_load_summary(&loaded);
    let mut frame = dataset_frame(&loaded.dataset)?;
    write_csv(&mut frame, &args.output)?;
    print_written(std::slice::from_ref(&args.output));
    Ok(())
}

pub fn run_summarize(args: &SummarizeArgs, config: &AnalysisConfig) -> Result<()> {
    let loaded = load_input(&args.input, config)?;
    let dataset = &loaded.dataset;
    print_load_summary(&loaded);

    let missing = missing_summary(dataset);
    let summaries = describe(dataset);
    let outliers = detect_outliers(dataset);
    print_missing(&missing);
    print_describe(&summaries);
    print_outliers(&outliers);

    let mut profiles = Vec::with_capacity(args.kpis.len());
    for kpi in &args.kpis {
        let profile = kpi_profile(dataset, kpi).with_context(|| format!("profile KPI {kpi}"))?;
        print_kpi(&profile, args.top);
        profiles.push(profile);
    }

    let groups = match &args.group_by {
        Some(field) => {
            let groups = group_summary(dataset, field, &args.value)
                .with_context(|| format!("summarise {} by {field}", args.value))?;
            print_groups(field, &args.value, &groups);
            Some((field, groups))
        }
        None => None,
    };

    if let Some(dir) = &args.output_dir {
        let mut written = vec![
            export(dir, "missing_values.csv", missing_frame(&missing)?)?,
            export(dir, "descriptive_statistics.csv", describe_frame(&summaries)?)?,
            export(dir, "outliers.csv", outlier_frame(&outliers)?)?,
        ];
        if let Some((field, groups)) = &groups {
            let name = format!("{}_by_{}.csv", args.value, field);
            written.push(export(dir, &name, group_frame(field, groups)?)?);
        }
        let path = dir.join("kpi_profiles.json");
        write_json(&path, &profiles)?;
        written.push(path);
        print_written(&written);
    }
    Ok(())
}

pub fn run_segment(args: &SegmentArgs, config: &AnalysisConfig) -> Result<()> {
    let loaded = load_input(&args.input, config)?;
    let dataset = &loaded.dataset;
    let (control, test) = resolve_labels(dataset, &args.split)?;
    let segmentation = segment(dataset, &args.split.field, &control, &test)?;
    print_segmentation(&segmentation);

    if !args.check.is_empty() {
        let runner = build_runner(config, args.alpha, None)?;
        let report = runner.check_equivalence(dataset, &segmentation, &args.check)?;
        print_equivalence(&report);
    }
    Ok(())
}

pub fn run_test(args: &TestArgs, config: &AnalysisConfig) -> Result<()> {
    let loaded = load_input(&args.input, config)?;
    let dataset = &loaded.dataset;
    let runner = build_runner(config, args.alpha, args.continuous_test)?;
    let metric = OutcomeMetric::parse(dataset, &args.metric)?;
    let (control, test) = resolve_labels(dataset, &args.split)?;
    let segmentation = segment(dataset, &args.split.field, &control, &test)?;

    let field = &args.split.field;
    let hypothesis = args.hypothesis.clone().unwrap_or_else(|| {
        format!(
            "There is no {} difference between {control} and {test} in {field}",
            metric.name
        )
    });
    let result = runner.run(dataset, &hypothesis, &segmentation, &metric)?;
    print_test_results(std::slice::from_ref(&result));

    let name = args
        .name
        .clone()
        .unwrap_or_else(|| format!("{field}_{}", metric.name));
    let dir = output_dir(args.output_dir.as_ref(), config);
    let report = write_test_report(&dir, &name, &result, &loaded.report_context(&args.input.input))?;
    let json = report.with_extension("json");
    write_json(&json, &result)?;
    print_written(&[report, json]);
    Ok(())
}

pub fn run_hypotheses(args: &HypothesesArgs, config: &AnalysisConfig) -> Result<()> {
    let loaded = load_input(&args.input, config)?;
    let runner = build_runner(config, args.alpha, args.continuous_test)?;
    let span = info_span!("hypotheses", alpha = runner.alpha());
    let _guard = span.enter();
    let start = Instant::now();

    let outcomes = run_standard_hypotheses(&loaded.dataset, &runner, &config.labels)?;
    let results: Vec<_> = outcomes.iter().map(|(_, result)| result.clone()).collect();
    print_test_results(&results);

    let dir = output_dir(args.output_dir.as_ref(), config);
    let context = loaded.report_context(&args.input.input);
    let mut written = Vec::with_capacity(outcomes.len() + 2);
    for (hypothesis, result) in &outcomes {
        written.push(write_test_report(&dir, hypothesis.key(), result, &context)?);
    }
    written.push(export(&dir, "hypothesis_results.csv", test_results_frame(&results)?)?);
    let json = dir.join("hypothesis_results.json");
    write_json(&json, &results)?;
    written.push(json);
    info!(
        tests = results.len(),
        rejected = results.iter().filter(|r| r.is_rejected()).count(),
        duration_ms = start.elapsed().as_millis(),
        "hypotheses complete"
    );
    print_written(&written);
    Ok(())
}

pub fn run_anova(args: &AnovaArgs, config: &AnalysisConfig) -> Result<()> {
    let loaded = load_input(&args.input, config)?;
    let dataset = &loaded.dataset;
    let runner = build_runner(config, args.alpha, None)?;
    let metric = OutcomeMetric::parse(dataset, &args.metric)?;
    let hypothesis = format!("There is no {} difference across {}", metric.name, args.field);
    let result = runner.run_anova(dataset, &hypothesis, &args.field, &metric)?;
    print_test_results(std::slice::from_ref(&result));

    let dir = output_dir(args.output_dir.as_ref(), config);
    let name = format!("{}_{}_anova", args.field, metric.name);
    let report = write_test_report(&dir, &name, &result, &loaded.report_context(&args.input.input))?;
    print_written(&[report]);
    Ok(())
}

pub fn run_model(args: &ModelArgs, config: &AnalysisConfig) -> Result<()> {
    let loaded = load_input(&args.input, config)?;

    let mut features = config.features.clone();
    let mut params = config.params.clone();
    let mut importance = config.importance.clone();
    if let Some(target) = &args.target {
        features.target.clone_from(target);
    }
    if let Some(task) = args.task {
        features.task = match task {
            TaskArg::Regression => Task::Regression,
            TaskArg::Classification => Task::Classification,
        };
    }
    if !args.features.is_empty() {
        features.features = Some(args.features.clone());
    }
    if let Some(ratio) = args.train_ratio {
        features.train_ratio = ratio;
    }
    if let Some(seed) = args.seed {
        features.seed = seed;
        params.seed = seed;
        importance.seed = seed;
    }
    if let Some(n_trees) = args.n_trees {
        params.n_trees = n_trees;
    }
    let kinds = if args.models.is_empty() {
        config.model_kinds()?
    } else {
        parse_model_kinds(&args.models)?
    };

    let prepared = prepare_features(&loaded.dataset, &features)
        .with_context(|| format!("prepare features for {}", features.target))?;
    println!(
        "Target {} ({:?}): {} training rows, {} test rows, {} features",
        prepared.target,
        prepared.task,
        prepared.train_rows.len(),
        prepared.test_rows.len(),
        prepared.feature_names().len()
    );

    let progress = ProgressBar::new(kinds.len() as u64);
    if let Ok(style) =
        ProgressStyle::with_template("{msg:>18} [{elapsed}] {wide_bar:.cyan/blue} {pos}/{len}")
    {
        progress.set_style(style);
    }
    progress.set_message("training");
    let reports =
        compare_models_with_progress(&prepared, &kinds, &params, &importance, |report| {
            progress.set_message(report.model.to_string());
            progress.inc(1);
        });
    progress.finish_and_clear();
    let reports = reports.context("compare models")?;

    print_model_reports(&reports);
    for report in &reports {
        print_importances(report);
    }

    let dir = output_dir(args.output_dir.as_ref(), config);
    let json = dir.join("model_reports.json");
    write_json(&json, &reports)?;
    let written = vec![
        export(&dir, "model_comparison.csv", model_comparison_frame(&reports)?)?,
        export(&dir, "feature_importance.csv", importance_frame(&reports)?)?,
        json,
    ];
    print_written(&written);
    Ok(())
}

fn load_input(input: &InputArgs, config: &AnalysisConfig) -> Result<Loaded> {
    let mut options = config.load.clone();
    if let Some(delimiter) = input.delimiter {
        options = options.with_delimiter(delimiter);
    }
    if input.max_rows.is_some() {
        options = options.with_max_rows(input.max_rows);
    }
    load(
        &input.input,
        &options,
        input.impute || config.impute,
        &config.imputation,
    )
}

fn build_runner(
    config: &AnalysisConfig,
    alpha: Option<f64>,
    test: Option<ContinuousTestArg>,
) -> Result<HypothesisRunner> {
    let test = match test {
        Some(ContinuousTestArg::Welch) => ContinuousTest::Welch,
        Some(ContinuousTestArg::Z) => ContinuousTest::Z,
        None => config.continuous_test,
    };
    let alpha = alpha.unwrap_or(config.significance);
    Ok(HypothesisRunner::new(alpha)?.with_continuous_test(test))
}

/// Explicit labels, filling any missing one from the two most frequent
/// labels of the field.
fn resolve_labels(dataset: &Dataset, split: &SplitArgs) -> Result<(String, String)> {
    if let (Some(control), Some(test)) = (&split.control, &split.test) {
        return Ok((control.clone(), test.clone()));
    }
    let (first, second) = default_labels(dataset, &split.field)
        .with_context(|| format!("pick default labels for {}", split.field))?;
    let (control, test) = match (&split.control, &split.test) {
        (Some(control), None) => {
            let other = if *control == first { second } else { first };
            (control.clone(), other)
        }
        (None, Some(test)) => {
            let other = if *test == first { second } else { first };
            (other, test.clone())
        }
        _ => (first, second),
    };
    info!(field = %split.field, control = %control, test = %test, "labels selected");
    Ok((control, test))
}

fn output_dir(requested: Option<&PathBuf>, config: &AnalysisConfig) -> PathBuf {
    requested.cloned().unwrap_or_else(|| config.output_dir.clone())
}

fn export(dir: &Path, name: &str, mut frame: DataFrame) -> Result<PathBuf> {
    let path = dir.join(name);
    write_csv(&mut frame, &path)?;
    Ok(path)
}
