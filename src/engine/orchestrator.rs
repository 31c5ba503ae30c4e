// Orchestrator - パイプライン全体の起動・停止手順

use super::{
    counters::ThroughputCounters,
    monitor::spawn_progress_monitor,
    pool::{WorkerContext, WorkerPool},
    sink::spawn_sink_drain,
    source::spawn_source_feed,
};
use crate::{
    channel::BoundedChannel,
    core::{
        PipelineCommand, PipelineConfig, PipelineError, PipelineResult, PipelineSummary,
        PricingEngine, ProgressReporter,
    },
};
use std::{path::Path, sync::Arc, time::Instant};
use tokio::{
    fs::File,
    io::{AsyncBufRead, AsyncWrite, BufReader},
    sync::mpsc,
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

const CONTROL_BUFFER: usize = 16;

/// 実行中のパイプラインにコマンドを送るハンドル
#[derive(Debug, Clone)]
pub struct PipelineControl {
    sender: mpsc::Sender<PipelineCommand>,
}

impl PipelineControl {
    /// ハンドルとコマンド受信側の組を作成
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<PipelineCommand>) {
        let (sender, commands) = mpsc::channel(buffer);
        (Self { sender }, commands)
    }

    pub async fn send(&self, command: PipelineCommand) -> PipelineResult<()> {
        self.sender
            .send(command)
            .await
            .map_err(|_| PipelineError::channel_closed("control"))
    }

    /// ワーカー数の変更を要求
    pub async fn resize(&self, parallelism_degree: usize) -> PipelineResult<()> {
        self.send(PipelineCommand::Resize(parallelism_degree)).await
    }

    /// パイプラインが既に終了しているか
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// パイプラインのオーケストレーター
///
/// ワーカープールの変更権限を唯一持ち、外部からのリサイズ要求は
/// [`PipelineControl`] 経由のコマンドとしてだけ受け付ける。
pub struct PipelineOrchestrator<C, P, R> {
    config: Arc<C>,
    engine: Arc<P>,
    reporter: Arc<R>,
    control: PipelineControl,
    commands: mpsc::Receiver<PipelineCommand>,
}

impl<C, P, R> PipelineOrchestrator<C, P, R>
where
    C: PipelineConfig,
    P: PricingEngine + 'static,
    R: ProgressReporter + 'static,
{
    pub fn new(config: C, engine: P, reporter: R) -> Self {
        let (control, commands) = PipelineControl::channel(CONTROL_BUFFER);
        Self {
            config: Arc::new(config),
            engine: Arc::new(engine),
            reporter: Arc::new(reporter),
            control,
            commands,
        }
    }

    /// コマンド送信用ハンドルを取得
    pub fn control(&self) -> PipelineControl {
        self.control.clone()
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    /// ファイルを入出力としてパイプラインを実行
    pub async fn run_files(
        self,
        input_path: &Path,
        output_path: &Path,
    ) -> PipelineResult<PipelineSummary> {
        let input = File::open(input_path)
            .await
            .map_err(|e| PipelineError::io(format!("opening {}", input_path.display()), e))?;
        let output = File::create(output_path)
            .await
            .map_err(|e| PipelineError::io(format!("creating {}", output_path.display()), e))?;

        self.run(BufReader::new(input), output).await
    }

    /// パイプラインを最後まで実行する
    ///
    /// 入力フォーマットエラーでも停止手順（ワーカー待機・出力クローズ・
    /// 書き出し完了・最終報告）を全て実行してからエラーを返す。
    /// 設定値が不正な場合は何も起動せずに `Configuration` エラーを返す。
    pub async fn run<I, W>(self, input: I, output: W) -> PipelineResult<PipelineSummary>
    where
        I: AsyncBufRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let Self {
            config,
            engine,
            reporter,
            control,
            commands,
        } = self;
        // 自分の送信側を手放し、外部ハンドルが全て落ちたら転送タスクが終わるようにする
        drop(control);
        validate_config(config.as_ref())?;

        let started = Instant::now();
        let counters = Arc::new(ThroughputCounters::new());
        let completed = CancellationToken::new();
        let input_channel = Arc::new(BoundedChannel::new("reader", config.reader_channel_bound()));
        let output_channel =
            Arc::new(BoundedChannel::new("writer", config.writer_channel_bound()));

        tracing::info!(
            parallelism_degree = config.parallelism_degree(),
            reader_channel_bound = config.reader_channel_bound(),
            writer_channel_bound = config.writer_channel_bound(),
            "pipeline starting"
        );

        // 1. 進捗監視
        let monitor = spawn_progress_monitor(
            Arc::clone(&counters),
            Arc::clone(&reporter),
            config.progress_interval(),
            completed.clone(),
        );

        // 2. ワーカープール
        let pool = Arc::new(WorkerPool::new(WorkerContext {
            input: Arc::clone(&input_channel),
            output: Arc::clone(&output_channel),
            engine,
            counters: Arc::clone(&counters),
            reporter: Arc::clone(&reporter) as Arc<dyn ProgressReporter>,
            simulated_latency_ms: config.simulated_latency_ms(),
        }));
        pool.resize_to(config.parallelism_degree());

        let forwarding = CancellationToken::new();
        let forwarder = spawn_command_forwarder(commands, Arc::clone(&pool), forwarding.clone());

        // 3. 入力と出力
        let source = spawn_source_feed(input, Arc::clone(&input_channel), Arc::clone(&counters));
        let sink = spawn_sink_drain(output, Arc::clone(&output_channel), Arc::clone(&counters));

        // 4. 入力の完了
        let source_result = join_stage(source).await;
        // パニック時もワーカーが枯渇を観測できるように
        input_channel.close();
        pool.mark_input_exhausted();

        // 5. 全ワーカーの終了（計算エラーは各ワーカーの終了時に報告済み）
        let pool_result = pool.join_all().await;
        forwarding.cancel();
        if let Err(error) = forwarder.await {
            tracing::warn!(%error, "command forwarder did not stop cleanly");
        }

        // 6. 出力を閉じる（ここ以外では閉じない）
        output_channel.close();

        // 7. 書き出しの完了
        let sink_result = join_stage(sink).await;

        // 8. 完了
        counters.mark_completed();
        completed.cancel();
        let monitor_result = monitor.await.map_err(PipelineError::task);

        let report = match source_result.and(pool_result) {
            Ok(report) => report,
            Err(error) => {
                tracing::error!(%error, "pipeline failed");
                return Err(error);
            }
        };
        sink_result?;
        if let Err(error) = monitor_result {
            tracing::error!(%error, "progress monitor failed");
            return Err(error);
        }

        let summary = PipelineSummary {
            lines_read: counters.lines_read(),
            items_computed: counters.items_computed(),
            lines_written: counters.lines_written(),
            workers_spawned: report.workers_spawned,
            workers_cancelled: report.workers_cancelled,
            workers_failed: report.failures.len(),
            elapsed: started.elapsed(),
        };
        tracing::info!(?summary, "pipeline finished");
        Ok(summary)
    }
}

/// 外部コマンドをワーカープールへ転送
fn spawn_command_forwarder<P>(
    mut commands: mpsc::Receiver<PipelineCommand>,
    pool: Arc<WorkerPool<P>>,
    stop: CancellationToken,
) -> JoinHandle<()>
where
    P: PricingEngine + 'static,
{
    tokio::spawn(async move {
        loop {
            let command = tokio::select! {
                _ = stop.cancelled() => break,
                command = commands.recv() => command,
            };

            match command {
                Some(PipelineCommand::Resize(target)) => {
                    tracing::debug!(target, "resize command received");
                    pool.resize_to(target);
                }
                None => break,
            }
        }
    })
}

async fn join_stage(handle: JoinHandle<PipelineResult<()>>) -> PipelineResult<()> {
    handle.await.map_err(PipelineError::task)?
}

/// チャンネルや監視タスクを作る前に設定値を確認する
fn validate_config<C>(config: &C) -> PipelineResult<()>
where
    C: PipelineConfig + ?Sized,
{
    if config.reader_channel_bound() == 0 {
        return Err(PipelineError::configuration(
            "reader channel bound must be at least 1",
        ));
    }
    if config.writer_channel_bound() == 0 {
        return Err(PipelineError::configuration(
            "writer channel bound must be at least 1",
        ));
    }
    if config.progress_interval().is_zero() {
        return Err(PipelineError::configuration(
            "progress interval must be greater than zero",
        ));
    }
    if let Some(range) = config.simulated_latency_ms() {
        if range.start() > range.end() {
            return Err(PipelineError::configuration(format!(
                "simulated latency range {}..={} is empty",
                range.start(),
                range.end()
            )));
        }
    }
    Ok(())
}
