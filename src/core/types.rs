// パイプラインで流れるデータ型定義

use rust_decimal::Decimal;
use std::time::Duration;

/// 入力1行から生成される貨物レコード
///
/// SourceFeedが生成し、ちょうど1つのワーカーが1回だけ消費する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GoodRecord {
    pub id: i64,
    pub height: i32,
    pub length: i32,
    pub width: i32,
    pub weight: i32,
}

impl GoodRecord {
    /// 入力フォーマットのカラム数
    pub const ARITY: usize = 5;
}

/// 価格計算の結果
///
/// ワーカーが生成し、SinkDrainが1回だけ消費する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalculationResult {
    pub id: i64,
    pub delivery_price: Decimal,
}

impl CalculationResult {
    pub fn new(id: i64, delivery_price: Decimal) -> Self {
        Self { id, delivery_price }
    }
}

/// 3つのスループットカウンタのスナップショット
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub lines_read: u64,
    pub items_computed: u64,
    pub lines_written: u64,
    pub completed: bool,
}

/// ワーカーの終了理由
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    /// 入力チャンネルが閉じられ、空になった
    Exhausted,
    /// リサイズで縮小対象になった
    Cancelled,
}

/// `resize_to` の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeOutcome {
    /// 入力枯渇後のため何もしなかった
    Ignored,
    /// 既に要求サイズだった
    Unchanged,
    Grown { spawned: usize },
    Shrunk { cancelled: usize },
}

/// 外部から Orchestrator に届くコマンド
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineCommand {
    Resize(usize),
}

/// パイプライン全体のサマリー
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSummary {
    pub lines_read: u64,
    pub items_computed: u64,
    pub lines_written: u64,
    pub workers_spawned: usize,
    pub workers_cancelled: usize,
    pub workers_failed: usize,
    pub elapsed: Duration,
}
