use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::parser::ParseEngine;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Fetch(FetchArgs),
    Parse(ParseArgs),
    Bench(BenchArgs),
}

#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Hansard URL or `HANSARD-…` day id (repeatable).
    #[arg(long = "url", required = true)]
    pub urls: Vec<String>,

    /// Concurrent fragment requests (default: HANSARD_WORKERS, WORKERS, or 2x cores).
    #[arg(long)]
    pub workers: Option<usize>,

    #[arg(long, value_enum, default_value_t = ParseEngine::Selector)]
    pub parse_engine: ParseEngine,

    /// Disable periodic progress log lines.
    #[arg(long)]
    pub no_progress: bool,

    /// Output directory for `<pdfid>.json`.
    #[arg(long, default_value = "storage")]
    pub out: String,

    /// Overwrite existing day outputs.
    #[arg(long)]
    pub force: bool,

    /// Only fetch the topic named by the URL's docid (and its ancestors).
    #[arg(long)]
    pub linked_topic_only: bool,

    #[arg(long, default_value = crate::api::DEFAULT_API_BASE)]
    pub api_base: String,

    /// Per-request timeout.
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Total attempts per fragment, including the first.
    #[arg(long, default_value_t = crate::retry::DEFAULT_MAX_ATTEMPTS)]
    pub retry_attempts: u32,

    #[arg(long, default_value_t = 3000)]
    pub retry_base_delay_ms: u64,

    #[arg(long, default_value_t = crate::retry::DEFAULT_BACKOFF_MULTIPLIER)]
    pub retry_backoff: f64,

    #[arg(long, default_value_t = 60_000)]
    pub retry_max_delay_ms: u64,

    /// HTTP status treated as transient (repeatable).
    #[arg(long = "retry-status", default_values_t = crate::retry::DEFAULT_TRANSIENT_STATUSES)]
    pub retry_statuses: Vec<u16>,
}

#[derive(Debug, Args)]
pub struct ParseArgs {
    /// Fragment HTML file.
    #[arg(long)]
    pub file: String,

    #[arg(long, value_enum, default_value_t = ParseEngine::Selector)]
    pub engine: ParseEngine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BenchEngine {
    Selector,
    Tree,
    All,
}

#[derive(Debug, Args)]
pub struct BenchArgs {
    /// HTML file or directory of `.html` files (repeatable; default: ./guide).
    #[arg(long = "files")]
    pub files: Vec<String>,

    /// Iterations per engine per file.
    #[arg(long, default_value_t = 20)]
    pub iterations: u32,

    #[arg(long, value_enum, default_value_t = BenchEngine::All)]
    pub engine: BenchEngine,
}
