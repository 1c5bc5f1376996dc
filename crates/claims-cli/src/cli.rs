//! CLI argument definitions for the claims analytics tool.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "claims",
    version,
    about = "Insurance claims analytics - quality checks, A/B risk tests and claim models",
    long_about = "Analyse historical motor insurance claims.\n\n\
                  Loads a claims extract, profiles data quality, tests risk hypotheses\n\
                  across segments and compares predictive models for claims and premiums."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Analysis settings file (TOML). Flags override its values.
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Convert a raw delimited extract into CSV.
    Convert(ConvertArgs),

    /// Load, type and optionally impute a dataset, then write it as CSV.
    Clean(CleanArgs),

    /// Missing values, descriptive statistics, outliers and KPI profiles.
    Summarize(SummarizeArgs),

    /// Split records into control and test groups and check their balance.
    Segment(SegmentArgs),

    /// Run one A/B hypothesis test.
    Test(TestArgs),

    /// Run the four standard risk and margin hypotheses.
    Hypotheses(HypothesesArgs),

    /// One-way ANOVA of a metric across every value of a field.
    Anova(AnovaArgs),

    /// Train, compare and interpret claim models.
    Model(ModelArgs),
}

/// Input options shared by every analysis command.
#[derive(Args)]
pub struct InputArgs {
    /// Claims extract (CSV or delimited text).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Field separator of the input file.
    #[arg(long = "delimiter", value_name = "CHAR")]
    pub delimiter: Option<char>,

    /// Read at most this many data rows.
    #[arg(long = "max-rows", value_name = "N")]
    pub max_rows: Option<usize>,

    /// Impute missing values after loading.
    #[arg(long = "impute")]
    pub impute: bool,
}

#[derive(Args)]
pub struct ConvertArgs {
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    /// Field separator of the raw extract.
    #[arg(long = "delimiter", default_value = "|", value_name = "CHAR")]
    pub delimiter: char,
}

#[derive(Args)]
pub struct CleanArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Cleaned CSV to write.
    #[arg(long = "output", short = 'o', value_name = "PATH")]
    pub output: PathBuf,
}

#[derive(Args)]
pub struct SummarizeArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Columns to profile as outcome metrics.
    #[arg(long = "kpi", value_name = "COLUMN", default_values_t = default_kpis())]
    pub kpis: Vec<String>,

    /// Group numeric statistics by this column.
    #[arg(long = "group-by", value_name = "COLUMN")]
    pub group_by: Option<String>,

    /// Value summarised per group.
    #[arg(long = "value", value_name = "COLUMN", default_value = "TotalClaims")]
    pub value: String,

    /// Number of most frequent labels shown per categorical KPI.
    #[arg(long = "top", default_value_t = 10)]
    pub top: usize,

    /// Write CSV exports into this directory.
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

fn default_kpis() -> Vec<String> {
    vec!["HasClaim".to_string(), "Margin".to_string()]
}

/// Field and the two labels to compare.
#[derive(Args)]
pub struct SplitArgs {
    /// Partition field.
    #[arg(long = "field", value_name = "COLUMN")]
    pub field: String,

    /// Control label (default: most frequent label).
    #[arg(long = "control", value_name = "LABEL")]
    pub control: Option<String>,

    /// Test label (default: second most frequent label).
    #[arg(long = "test", value_name = "LABEL")]
    pub test: Option<String>,
}

#[derive(Args)]
pub struct SegmentArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub split: SplitArgs,

    /// Covariates that should not differ between the groups.
    #[arg(long = "check", value_name = "COLUMN")]
    pub check: Vec<String>,

    /// Significance level.
    #[arg(long = "alpha")]
    pub alpha: Option<f64>,
}

#[derive(Args)]
pub struct TestArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub split: SplitArgs,

    /// Outcome metric: claim_frequency, margin, premium or a column name.
    #[arg(long = "metric", default_value = "claim_frequency")]
    pub metric: String,

    /// Report name (default: `<field>_<metric>`).
    #[arg(long = "name")]
    pub name: Option<String>,

    /// Statement of the null hypothesis.
    #[arg(long = "hypothesis")]
    pub hypothesis: Option<String>,

    /// Significance level.
    #[arg(long = "alpha")]
    pub alpha: Option<f64>,

    /// Test used for continuous metrics.
    #[arg(long = "continuous-test", value_enum)]
    pub continuous_test: Option<ContinuousTestArg>,

    /// Directory for the text report and JSON result.
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

#[derive(Args)]
pub struct HypothesesArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Significance level.
    #[arg(long = "alpha")]
    pub alpha: Option<f64>,

    /// Test used for continuous metrics.
    #[arg(long = "continuous-test", value_enum)]
    pub continuous_test: Option<ContinuousTestArg>,

    /// Directory for reports and exports.
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

#[derive(Args)]
pub struct AnovaArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Field whose values form the groups.
    #[arg(long = "field", value_name = "COLUMN")]
    pub field: String,

    /// Continuous outcome metric.
    #[arg(long = "metric", default_value = "margin")]
    pub metric: String,

    /// Significance level.
    #[arg(long = "alpha")]
    pub alpha: Option<f64>,

    /// Directory for the text report.
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

#[derive(Args)]
pub struct ModelArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Target column.
    #[arg(long = "target", value_name = "COLUMN")]
    pub target: Option<String>,

    /// Learning task (default: regression).
    #[arg(long = "task", value_enum)]
    pub task: Option<TaskArg>,

    /// Models to train (linear_regression, decision_tree, random_forest,
    /// gradient_boosting).
    #[arg(long = "model", value_name = "KIND")]
    pub models: Vec<String>,

    /// Feature columns (default: every non-excluded column).
    #[arg(long = "feature", value_name = "COLUMN")]
    pub features: Vec<String>,

    /// Share of rows used for training.
    #[arg(long = "train-ratio")]
    pub train_ratio: Option<f64>,

    /// Seed for the split, the models and the importances.
    #[arg(long = "seed")]
    pub seed: Option<u64>,

    /// Number of trees in the random forest.
    #[arg(long = "trees")]
    pub n_trees: Option<usize>,

    /// Directory for comparison and importance exports.
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ContinuousTestArg {
    Welch,
    Z,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum TaskArg {
    Regression,
    Classification,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_model_command() {
        let cli = Cli::try_parse_from([
            "claims",
            "--config",
            "analysis.toml",
            "model",
            "data.csv",
            "--model",
            "rf",
            "--model",
            "gbm",
            "--seed",
            "7",
        ])
        .unwrap();
        assert!(cli.config.is_some());
        let Command::Model(args) = cli.command else {
            panic!("expected model command");
        };
        assert_eq!(args.models, vec!["rf", "gbm"]);
        assert_eq!(args.seed, Some(7));
        assert_eq!(args.input.input, PathBuf::from("data.csv"));
    }

    #[test]
    fn summarize_defaults() {
        let cli = Cli::try_parse_from(["claims", "summarize", "data.csv"]).unwrap();
        let Command::Summarize(args) = cli.command else {
            panic!("expected summarize command");
        };
        assert_eq!(args.kpis, vec!["HasClaim", "Margin"]);
        assert_eq!(args.top, 10);
        assert_eq!(args.value, "TotalClaims");
    }
}
