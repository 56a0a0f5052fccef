use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod formatters;

#[derive(Parser)]
#[command(name = "comps")]
#[command(
    version,
    about = "Comparable-set preprocessing pipeline for neighborhood pricing analysis"
)]
#[command(
    long_about = "Loads two MLS listing exports (a target neighborhood and a broader comparison area), filters them to the configured comparable envelope, enriches them with derived fields, and prints load/exclusion accounting plus market statistics."
)]
pub struct Cli {
    /// Disable colorized/ANSI output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full pipeline and print per-dataset summaries
    Run {
        /// Path to the TOML configuration file
        #[arg(short, long)]
        config: PathBuf,

        /// Output results in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Re-run the pipeline and verify the comparable-envelope invariants
    /// on the exported datasets, exiting non-zero on violation
    Audit {
        /// Path to the TOML configuration file
        #[arg(short, long)]
        config: PathBuf,
    },
}
