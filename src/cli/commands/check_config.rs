use crate::core::PipelineConfig;
use crate::services::AppSettings;
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Load and validate a settings file, then print the effective values
pub fn execute_check_config(config: PathBuf) -> Result<AppSettings> {
    let settings = AppSettings::load(&config)
        .with_context(|| format!("Invalid settings file: {}", config.display()))?;

    let app = &settings.price_calculator_app_options;
    let pricing = &settings.price_calculator_options;

    println!("✅ 設定ファイルは有効です: {}", config.display());
    println!("⚙️  PriceCalculatorAppOptions:");
    println!("   - ParallelismDegree: {}", app.parallelism_degree());
    println!("   - ReaderChannelBound: {}", app.reader_channel_bound());
    println!("   - WriterChannelBound: {}", app.writer_channel_bound());
    println!("   - InputFileName: {}", app.input_file_name.display());
    println!("   - OutputFileName: {}", app.output_file_name.display());
    println!("   - ProgressIntervalMs: {}", app.progress_interval_ms);
    match app.simulated_latency_ms() {
        Some(range) => println!(
            "   - SimulatedLatencyMs: {}..={}",
            range.start(),
            range.end()
        ),
        None => println!("   - SimulatedLatencyMs: (なし)"),
    }
    println!("💰 PriceCalculatorOptions:");
    println!("   - VolumeToPriceRatio: {}", pricing.volume_to_price_ratio);
    println!("   - WeightToPriceRatio: {}", pricing.weight_to_price_ratio);

    Ok(settings)
}
