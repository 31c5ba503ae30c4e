// 進捗監視の具象実装

use crate::core::{ProgressReporter, ProgressSnapshot};
use async_trait::async_trait;

/// コンソール出力による進捗報告実装
#[derive(Debug, Default, Clone)]
pub struct ConsoleProgressReporter {
    quiet: bool,
}

impl ConsoleProgressReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn quiet() -> Self {
        Self { quiet: true }
    }
}

#[async_trait]
impl ProgressReporter for ConsoleProgressReporter {
    async fn report_progress(&self, snapshot: ProgressSnapshot) {
        if !self.quiet {
            println!(
                "📊 Read lines: {} | Processed lines: {} | Written lines: {}",
                snapshot.lines_read, snapshot.items_computed, snapshot.lines_written
            );
        }
    }

    async fn report_error(&self, worker_id: usize, error: &str) {
        if !self.quiet {
            eprintln!("❌ Worker {worker_id} stopped: {error}");
        }
    }

    async fn report_completed(&self, snapshot: ProgressSnapshot) {
        if !self.quiet {
            println!(
                "✅ Task completed! Read lines: {} | Processed lines: {} | Written lines: {}",
                snapshot.lines_read, snapshot.items_computed, snapshot.lines_written
            );
        }
    }
}

/// tracingイベントとして進捗を出す実装
#[derive(Debug, Default, Clone)]
pub struct TracingProgressReporter;

impl TracingProgressReporter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProgressReporter for TracingProgressReporter {
    async fn report_progress(&self, snapshot: ProgressSnapshot) {
        tracing::info!(
            lines_read = snapshot.lines_read,
            items_computed = snapshot.items_computed,
            lines_written = snapshot.lines_written,
            "progress"
        );
    }

    async fn report_error(&self, worker_id: usize, error: &str) {
        tracing::warn!(worker_id, error, "worker stopped with error");
    }

    async fn report_completed(&self, snapshot: ProgressSnapshot) {
        tracing::info!(
            lines_read = snapshot.lines_read,
            items_computed = snapshot.items_computed,
            lines_written = snapshot.lines_written,
            "task completed"
        );
    }
}

/// 何もしない進捗報告実装（テスト・ベンチマーク用）
#[derive(Debug, Default, Clone)]
pub struct NoOpProgressReporter;

impl NoOpProgressReporter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProgressReporter for NoOpProgressReporter {
    async fn report_progress(&self, _snapshot: ProgressSnapshot) {
        // 何もしない
    }

    async fn report_error(&self, _worker_id: usize, _error: &str) {
        // 何もしない
    }

    async fn report_completed(&self, _snapshot: ProgressSnapshot) {
        // 何もしない
    }
}
