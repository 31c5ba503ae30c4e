// エンドツーエンド統合テスト
use crate::fixtures::*;
use price_calculator::{
    cli::{execute_run, RunConfig},
    GoodRecord, NoOpProgressReporter, PipelineOrchestrator, PricingEngine,
    VolumetricPriceCalculator,
};
use std::{collections::HashMap, time::Duration};
use tempfile::TempDir;
use tokio::{io::AsyncReadExt, time::timeout};

fn expected_prices(records: &[Record]) -> HashMap<i64, String> {
    let calculator = VolumetricPriceCalculator::default();
    records
        .iter()
        .map(|&(id, height, length, width, weight)| {
            let price = calculator
                .calculate_price(&GoodRecord {
                    id,
                    height,
                    length,
                    width,
                    weight,
                })
                .unwrap();
            (id, price.to_string())
        })
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_two_records_two_workers() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("input.csv");
    let output = temp_dir.path().join("output.csv");
    std::fs::write(&input, "id,height,length,width,weight\n1,10,10,10,5\n2,20,5,5,5\n").unwrap();

    let orchestrator = PipelineOrchestrator::new(
        app_options(2),
        VolumetricPriceCalculator::default(),
        NoOpProgressReporter::new(),
    );
    let summary = orchestrator.run_files(&input, &output).await.unwrap();

    let written = std::fs::read_to_string(&output).unwrap();
    let (header, prices) = parse_output(&written);
    assert_eq!(header, "id,delivery_price");
    assert_eq!(prices.len(), 2);
    assert_eq!(prices[&1], "3.27");
    assert_eq!(prices[&2], "1.635");
    assert_eq!(summary.lines_written, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_large_input_every_record_priced_once() {
    let records = generated_records(2_000);
    let orchestrator = PipelineOrchestrator::new(
        app_options(6),
        VolumetricPriceCalculator::default(),
        NoOpProgressReporter::new(),
    );

    let (writer, mut reader) = tokio::io::duplex(1 << 20);
    let run = tokio::spawn(orchestrator.run(input_reader(input_csv(&records)), writer));

    let mut output = String::new();
    reader.read_to_string(&mut output).await.unwrap();
    let summary = timeout(Duration::from_secs(10), run)
        .await
        .unwrap()
        .unwrap()
        .unwrap();

    let (header, prices) = parse_output(&output);
    assert_eq!(header, "id,delivery_price");
    assert_eq!(prices, expected_prices(&records));
    assert_eq!(summary.lines_read, 2_000);
    assert_eq!(summary.items_computed, 2_000);
    assert_eq!(summary.lines_written, 2_000);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_single_slot_channels_still_complete() {
    let records = generated_records(200);
    let options = app_options(3).with_channel_bounds(1, 1);
    let orchestrator = PipelineOrchestrator::new(
        options,
        VolumetricPriceCalculator::default(),
        NoOpProgressReporter::new(),
    );

    let (writer, mut reader) = tokio::io::duplex(1 << 20);
    let run = tokio::spawn(orchestrator.run(input_reader(input_csv(&records)), writer));

    let mut output = String::new();
    reader.read_to_string(&mut output).await.unwrap();
    timeout(Duration::from_secs(10), run)
        .await
        .unwrap()
        .unwrap()
        .unwrap();

    assert_eq!(parse_output(&output).1, expected_prices(&records));
}

#[tokio::test]
async fn test_cli_run_with_settings_file() {
    let temp_dir = TempDir::new().unwrap();
    let settings_path = temp_dir.path().join("appsettings.json");
    write_settings(
        &settings_path,
        app_options(3)
            .with_input_file("goods.csv")
            .with_output_file("prices.csv"),
    );
    let records = generated_records(50);
    std::fs::write(temp_dir.path().join("goods.csv"), input_csv(&records)).unwrap();

    let summary = execute_run(RunConfig {
        config: settings_path,
        input: None,
        output: None,
        parallelism: None,
        quiet: true,
        watch_interval_ms: 0,
    })
    .await
    .unwrap();

    assert_eq!(summary.workers_spawned, 3);
    let written = std::fs::read_to_string(temp_dir.path().join("prices.csv")).unwrap();
    assert_eq!(parse_output(&written).1, expected_prices(&records));
}
