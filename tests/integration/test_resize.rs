// 実行中のワーカー数変更の統合テスト
use crate::fixtures::*;
use price_calculator::{
    cli::{execute_run, RunConfig},
    NoOpProgressReporter, PipelineOrchestrator, PipelineSummary, PriceCalculatorAppOptions,
    VolumetricPriceCalculator,
};
use std::{collections::HashMap, time::Duration};
use tempfile::TempDir;
use tokio::{io::AsyncReadExt, time::sleep};

/// `commands` を `(待ち時間, 並列度)` の順に送りながら実行する
async fn run_with_resizes(
    options: PriceCalculatorAppOptions,
    records: i64,
    commands: &[(u64, usize)],
) -> (PipelineSummary, HashMap<i64, String>) {
    let orchestrator = PipelineOrchestrator::new(
        options,
        VolumetricPriceCalculator::default(),
        NoOpProgressReporter::new(),
    );
    let control = orchestrator.control();

    let (writer, mut reader) = tokio::io::duplex(1 << 20);
    let run = tokio::spawn(orchestrator.run(input_reader(input_csv(&generated_records(records))), writer));
    let collect = tokio::spawn(async move {
        let mut output = String::new();
        reader.read_to_string(&mut output).await.unwrap();
        output
    });

    for &(delay_ms, degree) in commands {
        sleep(Duration::from_millis(delay_ms)).await;
        control.resize(degree).await.unwrap();
    }

    let summary = run.await.unwrap().unwrap();
    let output = collect.await.unwrap();
    (summary, parse_output(&output).1)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_four_to_one_cancels_three_workers() {
    let options = app_options(4)
        .with_channel_bounds(4, 4)
        .with_simulated_latency_ms(10, 20);

    let (summary, prices) = run_with_resizes(options, 80, &[(40, 1)]).await;

    assert_eq!(summary.workers_spawned, 4);
    assert_eq!(summary.workers_cancelled, 3);
    assert_eq!(summary.lines_written, 80);
    assert_eq!(prices.len(), 80);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_grow_from_one_to_five() {
    let options = app_options(1)
        .with_channel_bounds(4, 4)
        .with_simulated_latency_ms(5, 10);

    let (summary, prices) = run_with_resizes(options, 60, &[(20, 5)]).await;

    assert_eq!(summary.workers_spawned, 5);
    assert_eq!(summary.workers_cancelled, 0);
    assert_eq!(prices.len(), 60);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_shrink_to_zero_and_recover() {
    let options = app_options(1)
        .with_channel_bounds(2, 2)
        .with_simulated_latency_ms(5, 10);

    let (summary, prices) = run_with_resizes(options, 40, &[(20, 0), (50, 2)]).await;

    assert_eq!(summary.workers_spawned, 3);
    assert_eq!(summary.workers_cancelled, 1);
    assert_eq!(prices.len(), 40);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_settings_edit_resizes_running_pipeline() {
    let temp_dir = TempDir::new().unwrap();
    let settings_path = temp_dir.path().join("appsettings.json");
    let options = app_options(4)
        .with_channel_bounds(4, 4)
        .with_simulated_latency_ms(10, 20)
        .with_input_file("input.csv")
        .with_output_file("output.csv");
    write_settings(&settings_path, options.clone());
    std::fs::write(
        temp_dir.path().join("input.csv"),
        input_csv(&generated_records(100)),
    )
    .unwrap();

    let run = tokio::spawn(execute_run(RunConfig {
        config: settings_path.clone(),
        input: None,
        output: None,
        parallelism: None,
        quiet: true,
        watch_interval_ms: 10,
    }));

    sleep(Duration::from_millis(50)).await;
    write_settings(&settings_path, options.with_parallelism_degree(1));

    let summary = run.await.unwrap().unwrap();
    assert_eq!(summary.workers_spawned, 4);
    assert_eq!(summary.workers_cancelled, 3);
    assert_eq!(summary.lines_written, 100);

    let written = std::fs::read_to_string(temp_dir.path().join("output.csv")).unwrap();
    assert_eq!(parse_output(&written).1.len(), 100);
}
