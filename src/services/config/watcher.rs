// 設定ファイルの変更監視

use super::implementations::AppSettings;
use crate::engine::PipelineControl;
use std::{path::PathBuf, time::Duration};
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// 設定ファイルを定期的に読み直し、`ParallelismDegree` の変更をリサイズ要求として送る
///
/// `baseline` は起動時に読み込み済みの内容で、最初の比較元になる。
/// 読み込めない・検証に失敗した内容はログに残して無視する。
/// `shutdown` がキャンセルされるか、パイプラインが終了したら停止する。
pub fn spawn_config_watcher(
    path: PathBuf,
    poll_interval: Duration,
    baseline: String,
    initial_degree: usize,
    control: PipelineControl,
    shutdown: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut last_content = baseline;
        let mut current_degree = initial_degree;
        tracing::debug!(path = %path.display(), "config watcher started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }
            if control.is_closed() {
                break;
            }

            let content = match tokio::fs::read_to_string(&path).await {
                Ok(content) => content,
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "config reload failed");
                    continue;
                }
            };
            if last_content == content {
                continue;
            }

            let settings = AppSettings::from_json_str(&content);
            last_content = content;
            let settings = match settings {
                Ok(settings) => settings,
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "invalid config ignored");
                    continue;
                }
            };

            let degree = settings.price_calculator_app_options.parallelism_degree;
            if degree == current_degree {
                continue;
            }

            tracing::info!(from = current_degree, to = degree, "parallelism degree changed");
            if control.resize(degree).await.is_err() {
                break;
            }
            current_degree = degree;
        }

        tracing::debug!(path = %path.display(), "config watcher stopped");
    })
}
