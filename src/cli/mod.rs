//! CLI implementation using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Ripple - SATD detection and impact ripple analysis.
#[derive(Parser)]
#[command(name = "ripple")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the repository to analyze
    #[arg(short, long, default_value = ".")]
    pub path: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// JSON result file destination
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Detect SATD, link it, discover chains, and rank by impact ripple
    Analyze(AnalyzeArgs),

    /// Run the reference commit-scenario harness
    Scenario(ScenarioArgs),
}

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Maximum number of ranked items to print
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

#[derive(Args)]
pub struct ScenarioArgs {
    /// Scenario id to run
    #[arg(long)]
    pub scenario: Option<u32>,

    /// Run every built-in scenario
    #[arg(long)]
    pub all: bool,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Markdown,
    Text,
}
