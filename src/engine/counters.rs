// スループットカウンタ - 各ステージの処理件数

use crate::core::ProgressSnapshot;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// ステージごとの独立したアトミックカウンタ
///
/// 書き込みが大半で順序に依存しないため、ロックは使わない。
#[derive(Debug, Default)]
pub struct ThroughputCounters {
    lines_read: AtomicU64,
    items_computed: AtomicU64,
    lines_written: AtomicU64,
    completed: AtomicBool,
}

impl ThroughputCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_read(&self) {
        self.lines_read.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_computed(&self) {
        self.items_computed.fetch_add(1, Ordering::Relaxed);
    }

    /// 出力先へ届いた行数をまとめて加算
    pub fn record_written(&self, lines: u64) {
        self.lines_written.fetch_add(lines, Ordering::Relaxed);
    }

    pub fn lines_read(&self) -> u64 {
        self.lines_read.load(Ordering::Relaxed)
    }

    pub fn items_computed(&self) -> u64 {
        self.items_computed.load(Ordering::Relaxed)
    }

    pub fn lines_written(&self) -> u64 {
        self.lines_written.load(Ordering::Relaxed)
    }

    /// パイプライン完了をマーク
    pub fn mark_completed(&self) {
        self.completed.store(true, Ordering::Release);
    }

    pub fn is_completed(&self) -> bool {
        self.completed.load(Ordering::Acquire)
    }

    /// 現在値のスナップショット（ベストエフォート）
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            lines_read: self.lines_read(),
            items_computed: self.items_computed(),
            lines_written: self.lines_written(),
            completed: self.is_completed(),
        }
    }
}
