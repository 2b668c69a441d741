use clap::{Parser, Subcommand, ValueEnum};
use rigor_core::ExecutionMode;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "rigor",
    version,
    about = "Deterministic, evidence-grounded scoring of research documents"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Score a parsed document using recorded tool outputs
    Score(ScoreArgs),
    /// Inspect or prune the score cache
    Cache(CacheArgs),
    Version,
}

#[derive(Parser, Debug, Clone)]
pub struct ScoreArgs {
    /// Parsed document (JSON: `text` plus `pages` with text blocks)
    #[arg(long)]
    pub document: PathBuf,

    /// Recorded tool outputs (JSON, keyed by tool kind)
    #[arg(long)]
    pub recording: PathBuf,

    /// Pipeline config (YAML)
    #[arg(long, env = "RIGOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// SQLite score cache; omitted means no caching
    #[arg(long, env = "RIGOR_CACHE_DB")]
    pub cache_db: Option<PathBuf>,

    /// Ignore the cache even if --cache-db is set
    #[arg(long)]
    pub no_cache: bool,

    /// Write the full JSON report here
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Override the execution strategy from config
    #[arg(long, value_enum)]
    pub execution: Option<ExecutionArg>,

    /// Print the JSON report to stdout instead of the summary
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExecutionArg {
    Auto,
    Concurrent,
    Sequential,
}

impl From<ExecutionArg> for ExecutionMode {
    fn from(v: ExecutionArg) -> Self {
        match v {
            ExecutionArg::Auto => ExecutionMode::Auto,
            ExecutionArg::Concurrent => ExecutionMode::Concurrent,
            ExecutionArg::Sequential => ExecutionMode::Sequential,
        }
    }
}

#[derive(Parser, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub cmd: CacheSub,
}

#[derive(Subcommand, Debug)]
pub enum CacheSub {
    /// Entry counts per cache version
    Stats {
        #[arg(long, env = "RIGOR_CACHE_DB")]
        cache_db: PathBuf,
    },
    /// Delete entries of every version except one
    Purge {
        #[arg(long, env = "RIGOR_CACHE_DB")]
        cache_db: PathBuf,

        /// Pipeline config (YAML) whose `cache_version` is kept by default
        #[arg(long, env = "RIGOR_CONFIG")]
        config: Option<PathBuf>,

        /// Version to keep (defaults to the configured cache version)
        #[arg(long)]
        keep_version: Option<u32>,
    },
}
