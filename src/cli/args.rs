use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "price_calculator")]
#[command(about = "Computes delivery prices for shipment records with a resizable worker pool")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Price every record of the input file and write the results
    Run {
        /// Settings file
        #[arg(short, long, default_value = "appsettings.json")]
        config: PathBuf,

        /// Input file (overrides InputFileName)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output file (overrides OutputFileName)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Initial number of workers (overrides ParallelismDegree)
        #[arg(short, long)]
        parallelism: Option<usize>,

        /// Suppress progress output
        #[arg(short, long)]
        quiet: bool,

        /// Poll interval in milliseconds for settings changes (0 disables watching)
        #[arg(long, default_value = "1000")]
        watch_interval_ms: u64,
    },

    /// Validate a settings file without running the pipeline
    CheckConfig {
        /// Settings file
        #[arg(default_value = "appsettings.json")]
        config: PathBuf,
    },
}
