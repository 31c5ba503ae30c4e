// 進捗報告の統合テスト
use crate::fixtures::*;
use price_calculator::{PipelineOrchestrator, ProgressSnapshot, VolumetricPriceCalculator};
use tokio::io::AsyncReadExt;

fn assert_non_decreasing(reports: &[ProgressSnapshot]) {
    for pair in reports.windows(2) {
        assert!(pair[0].lines_read <= pair[1].lines_read);
        assert!(pair[0].items_computed <= pair[1].items_computed);
        assert!(pair[0].lines_written <= pair[1].lines_written);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_periodic_and_final_reports() {
    let reporter = RecordingReporter::new();
    let orchestrator = PipelineOrchestrator::new(
        app_options(2).with_simulated_latency_ms(5, 10),
        VolumetricPriceCalculator::default(),
        reporter.clone(),
    );

    let (writer, mut reader) = tokio::io::duplex(1 << 20);
    let run = tokio::spawn(orchestrator.run(input_reader(input_csv(&generated_records(100))), writer));
    let mut output = String::new();
    reader.read_to_string(&mut output).await.unwrap();
    run.await.unwrap().unwrap();

    let progress = reporter.progress();
    assert!(!progress.is_empty(), "expected periodic reports");
    assert!(progress.iter().all(|snapshot| !snapshot.completed));
    assert_non_decreasing(&progress);

    assert_eq!(
        reporter.completed(),
        vec![ProgressSnapshot {
            lines_read: 100,
            items_computed: 100,
            lines_written: 100,
            completed: true,
        }]
    );
    assert!(reporter.errors().is_empty());
}

#[tokio::test]
async fn test_final_report_once_for_fast_run() {
    let reporter = RecordingReporter::new();
    let orchestrator = PipelineOrchestrator::new(
        app_options(1).with_progress_interval_ms(60_000),
        VolumetricPriceCalculator::default(),
        reporter.clone(),
    );

    let (writer, mut reader) = tokio::io::duplex(1 << 20);
    let run = tokio::spawn(orchestrator.run(input_reader(input_csv(&generated_records(3))), writer));
    let mut output = String::new();
    reader.read_to_string(&mut output).await.unwrap();
    run.await.unwrap().unwrap();

    assert!(reporter.progress().is_empty());
    assert_eq!(reporter.completed().len(), 1);
    assert_eq!(reporter.completed()[0].lines_written, 3);
}
