use crate::core::PipelineSummary;
use crate::engine::PipelineOrchestrator;
use crate::services::{
    config::spawn_config_watcher, AppSettings, ConsoleProgressReporter, VolumetricPriceCalculator,
};
use anyhow::{Context, Result};
use std::{path::PathBuf, time::Duration};
use tokio_util::sync::CancellationToken;

/// Configuration struct for run command to reduce argument count
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub config: PathBuf,
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub parallelism: Option<usize>,
    pub quiet: bool,
    pub watch_interval_ms: u64,
}

/// Price every record of the input file
///
/// While the pipeline runs, edits to `ParallelismDegree` in the settings file
/// are forwarded as resize commands.
pub async fn execute_run(config: RunConfig) -> Result<PipelineSummary> {
    let (settings, loaded_content) = AppSettings::load_with_content(&config.config)
        .with_context(|| format!("Failed to load settings: {}", config.config.display()))?;

    let mut app_options = settings.price_calculator_app_options;
    if let Some(input) = config.input {
        app_options.input_file_name = input;
    }
    if let Some(output) = config.output {
        app_options.output_file_name = output;
    }
    if let Some(parallelism) = config.parallelism {
        app_options.parallelism_degree = parallelism;
    }

    let input_path = app_options.input_file_name.clone();
    let output_path = app_options.output_file_name.clone();
    if !input_path.exists() {
        anyhow::bail!("Input file does not exist: {}", input_path.display());
    }

    if !config.quiet {
        println!("🚚 配送価格計算ツール - runコマンド");
        println!("📄 入力ファイル: {}", input_path.display());
        println!("📄 出力ファイル: {}", output_path.display());
        println!("⚙️  設定:");
        println!("   - 並列度: {}", app_options.parallelism_degree);
        println!("   - 入力チャンネル容量: {}", app_options.reader_channel_bound);
        println!("   - 出力チャンネル容量: {}", app_options.writer_channel_bound);
    }

    let reporter = if config.quiet {
        ConsoleProgressReporter::quiet()
    } else {
        ConsoleProgressReporter::new()
    };
    let initial_degree = app_options.parallelism_degree;
    let orchestrator = PipelineOrchestrator::new(
        app_options,
        VolumetricPriceCalculator::from_options(&settings.price_calculator_options),
        reporter,
    );

    let shutdown = CancellationToken::new();
    let watcher = (config.watch_interval_ms > 0).then(|| {
        spawn_config_watcher(
            config.config.clone(),
            Duration::from_millis(config.watch_interval_ms),
            loaded_content,
            initial_degree,
            orchestrator.control(),
            shutdown.clone(),
        )
    });

    let result = orchestrator.run_files(&input_path, &output_path).await;

    shutdown.cancel();
    if let Some(watcher) = watcher {
        watcher.await?;
    }

    let summary =
        result.with_context(|| format!("Failed to price {}", input_path.display()))?;

    if !config.quiet {
        println!("\n✅ 処理完了!");
        println!("📊 処理結果:");
        println!("   - 読み込み行数: {}", summary.lines_read);
        println!("   - 計算件数: {}", summary.items_computed);
        println!("   - 書き込み行数: {}", summary.lines_written);
        println!(
            "   - ワーカー: 起動 {} / キャンセル {} / 異常終了 {}",
            summary.workers_spawned, summary.workers_cancelled, summary.workers_failed
        );
        println!("   - 総処理時間: {:.2}秒", summary.elapsed.as_secs_f64());

        if summary.workers_failed > 0 {
            println!(
                "⚠️  {}個のワーカーが価格計算エラーで停止しました",
                summary.workers_failed
            );
        }

        println!("📄 結果は {} に保存されました", output_path.display());
    }

    Ok(summary)
}
