use anyhow::Result;
use clap::Parser;
use price_calculator::cli::{execute_check_config, execute_run, Cli, Commands, RunConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            config,
            input,
            output,
            parallelism,
            quiet,
            watch_interval_ms,
        } => execute_run(RunConfig {
            config,
            input,
            output,
            parallelism,
            quiet,
            watch_interval_ms,
        })
        .await
        .map(|_| ()),
        Commands::CheckConfig { config } => execute_check_config(config).map(|_| ()),
    };

    if let Err(error) = result {
        eprintln!("❌ エラー: {error:#}");
        std::process::exit(1);
    }

    Ok(())
}
