// テスト用の進捗報告実装
// mockallのモックでは呼び出し内容を後から検査しにくいため、記録型を用意する

use async_trait::async_trait;
use parking_lot::Mutex;
use price_calculator::{ProgressReporter, ProgressSnapshot};
use std::sync::Arc;

#[derive(Debug, Default)]
struct Recorded {
    progress: Mutex<Vec<ProgressSnapshot>>,
    errors: Mutex<Vec<(usize, String)>>,
    completed: Mutex<Vec<ProgressSnapshot>>,
}

/// 受け取った報告を全て記録する
///
/// クローンは記録を共有するので、オーケストレーターに渡した後も検査できる。
#[derive(Debug, Default, Clone)]
pub struct RecordingReporter {
    recorded: Arc<Recorded>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn progress(&self) -> Vec<ProgressSnapshot> {
        self.recorded.progress.lock().clone()
    }

    pub fn errors(&self) -> Vec<(usize, String)> {
        self.recorded.errors.lock().clone()
    }

    pub fn completed(&self) -> Vec<ProgressSnapshot> {
        self.recorded.completed.lock().clone()
    }
}

#[async_trait]
impl ProgressReporter for RecordingReporter {
    async fn report_progress(&self, snapshot: ProgressSnapshot) {
        self.recorded.progress.lock().push(snapshot);
    }

    async fn report_error(&self, worker_id: usize, error: &str) {
        self.recorded
            .errors
            .lock()
            .push((worker_id, error.to_string()));
    }

    async fn report_completed(&self, snapshot: ProgressSnapshot) {
        self.recorded.completed.lock().push(snapshot);
    }
}
