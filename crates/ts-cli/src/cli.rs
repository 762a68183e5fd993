//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Calendar time allocation reports.
///
/// Fetches events from a calendar, tags each one with work categories by
/// keyword, and prints how the measured days were spent.
#[derive(Debug, Parser)]
#[command(name = "timesplit", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the time allocation report.
    Report(ReportArgs),

    /// Show which categories titles are counted under.
    Classify(ClassifyArgs),
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Read a saved `events.list` JSON response instead of calling the API
    /// (`-` for stdin).
    #[arg(long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ClassifyArgs {
    /// Event titles to classify.
    #[arg(required = true)]
    pub titles: Vec<String>,

    /// Output as JSON lines.
    #[arg(long)]
    pub json: bool,
}
