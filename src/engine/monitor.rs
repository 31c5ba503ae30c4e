// ProgressMonitor - 定期的な進捗報告

use super::counters::ThroughputCounters;
use crate::core::ProgressReporter;
use std::{sync::Arc, time::Duration};
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// ProgressMonitor: 完了まで一定間隔でカウンタを報告する
///
/// `completed` がキャンセルされたら最終スナップショットを1回だけ報告して終了する。
/// 報告はベストエフォートで、最大1間隔分古い可能性がある。
pub fn spawn_progress_monitor<R>(
    counters: Arc<ThroughputCounters>,
    reporter: Arc<R>,
    period: Duration,
    completed: CancellationToken,
) -> tokio::task::JoinHandle<()>
where
    R: ProgressReporter + ?Sized + 'static,
{
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // 最初のtickは即座に完了するので読み捨てる
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = completed.cancelled() => break,
                _ = ticker.tick() => {
                    let snapshot = counters.snapshot();
                    if snapshot.completed {
                        break;
                    }
                    reporter.report_progress(snapshot).await;
                }
            }
        }

        let mut snapshot = counters.snapshot();
        snapshot.completed = true;
        reporter.report_completed(snapshot).await;
    })
}
