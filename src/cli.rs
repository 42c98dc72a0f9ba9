use std::num::NonZeroUsize;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::metrics::DEFAULT_TOP_N_KEYWORDS;
use crate::metrics::mtld::DEFAULT_TTR_THRESHOLD;

#[derive(Parser, Debug)]
#[command(
    name = "article-metrics",
    version,
    about = "Parallel text metrics over versioned article corpora"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Inventory(InventoryArgs),
    Metric(MetricArgs),
    RunAll(RunArgs),
    ListMetrics,
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CorpusArgs {
    #[arg(long, default_value = "data/articles")]
    pub corpus_root: PathBuf,

    #[arg(long, default_value = "analytics/output")]
    pub output_root: PathBuf,

    #[arg(
        long,
        value_delimiter = ',',
        default_value = "adult_full,adult_short,child_short"
    )]
    pub versions: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct InventoryArgs {
    #[command(flatten)]
    pub corpus: CorpusArgs,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct MetricArgs {
    /// Registered metric name; see `list-metrics`.
    pub name: String,

    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub corpus: CorpusArgs,

    /// Worker pool size; defaults to one worker per available CPU.
    #[arg(long)]
    pub workers: Option<NonZeroUsize>,

    #[arg(long, value_enum, default_value_t = AnnotatorKind::Regex)]
    pub annotator: AnnotatorKind,

    /// Program started once per worker when `--annotator command` is used.
    #[arg(long)]
    pub annotator_command: Option<String>,

    #[arg(long = "annotator-arg", allow_hyphen_values = true)]
    pub annotator_args: Vec<String>,

    #[arg(long, default_value_t = DEFAULT_TTR_THRESHOLD, value_parser = parse_threshold)]
    pub mtld_threshold: f64,

    #[arg(long, default_value_t = DEFAULT_TOP_N_KEYWORDS)]
    pub top_n_keywords: usize,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum AnnotatorKind {
    Regex,
    Command,
}

impl AnnotatorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Regex => "regex",
            Self::Command => "command",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[command(flatten)]
    pub corpus: CorpusArgs,
}

fn parse_threshold(raw: &str) -> Result<f64, String> {
    let value = raw
        .parse::<f64>()
        .map_err(|err| format!("invalid threshold {raw}: {err}"))?;
    if value > 0.0 && value <= 1.0 {
        Ok(value)
    } else {
        Err(format!("threshold must lie in (0, 1], got {value}"))
    }
}
