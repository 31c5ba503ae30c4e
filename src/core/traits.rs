// パイプラインのトレイト定義
// 外部コラボレーターとの境界を抽象化する

use super::error::PricingError;
use super::types::{GoodRecord, ProgressSnapshot};
use async_trait::async_trait;
use mockall::automock;
use rust_decimal::Decimal;
use std::ops::RangeInclusive;
use std::time::Duration;

/// パイプライン設定を抽象化するトレイト
#[automock]
pub trait PipelineConfig: Send + Sync {
    /// 初期ワーカー数
    fn parallelism_degree(&self) -> usize;

    /// 入力チャンネルの容量
    fn reader_channel_bound(&self) -> usize;

    /// 出力チャンネルの容量
    fn writer_channel_bound(&self) -> usize;

    /// 進捗報告の間隔
    fn progress_interval(&self) -> Duration;

    /// 1件あたりの擬似計算時間（ミリ秒）
    fn simulated_latency_ms(&self) -> Option<RangeInclusive<u64>>;
}

// PipelineConfig for Box<dyn PipelineConfig>
impl PipelineConfig for Box<dyn PipelineConfig> {
    fn parallelism_degree(&self) -> usize {
        self.as_ref().parallelism_degree()
    }

    fn reader_channel_bound(&self) -> usize {
        self.as_ref().reader_channel_bound()
    }

    fn writer_channel_bound(&self) -> usize {
        self.as_ref().writer_channel_bound()
    }

    fn progress_interval(&self) -> Duration {
        self.as_ref().progress_interval()
    }

    fn simulated_latency_ms(&self) -> Option<RangeInclusive<u64>> {
        self.as_ref().simulated_latency_ms()
    }
}

/// 配送価格計算エンジン
///
/// 純粋関数として扱う。ワーカー間で共有されるため `Send + Sync`。
#[automock]
pub trait PricingEngine: Send + Sync {
    fn calculate_price(&self, good: &GoodRecord) -> Result<Decimal, PricingError>;
}

/// 進捗報告の抽象化トレイト
#[automock]
#[async_trait]
pub trait ProgressReporter: Send + Sync {
    /// 定期的な進捗スナップショット
    async fn report_progress(&self, snapshot: ProgressSnapshot);

    /// ワーカーで発生したエラーの報告
    async fn report_error(&self, worker_id: usize, error: &str);

    /// 完了時の最終スナップショット
    async fn report_completed(&self, snapshot: ProgressSnapshot);
}

// ProgressReporter for Box<dyn ProgressReporter>
#[async_trait]
impl ProgressReporter for Box<dyn ProgressReporter> {
    async fn report_progress(&self, snapshot: ProgressSnapshot) {
        self.as_ref().report_progress(snapshot).await
    }

    async fn report_error(&self, worker_id: usize, error: &str) {
        self.as_ref().report_error(worker_id, error).await
    }

    async fn report_completed(&self, snapshot: ProgressSnapshot) {
        self.as_ref().report_completed(snapshot).await
    }
}
