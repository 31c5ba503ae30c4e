// SinkDrain - 計算結果の書き出し

use super::counters::ThroughputCounters;
use crate::{
    channel::BoundedChannel,
    core::{CalculationResult, PipelineError, PipelineResult},
};
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};

/// 出力ファイルのヘッダー行
pub const OUTPUT_HEADER: &str = "id,delivery_price";

/// フラッシュせずにバッファへ溜める最大行数
const FLUSH_BATCH: u64 = 64;

/// SinkDrain: 出力チャンネルが枯渇するまで結果を書き出す
///
/// 書き込みに失敗しても上流が詰まらないよう、枯渇までチャンネルの排出は続け、
/// 最初のI/Oエラーを最後に返す。
///
/// `lines_written` はフラッシュが成功して出力先へ渡った行だけを数える。
/// チャンネルが一時的に空になった時点と [`FLUSH_BATCH`] 行ごとにフラッシュする。
pub fn spawn_sink_drain<W>(
    writer: W,
    channel: Arc<BoundedChannel<CalculationResult>>,
    counters: Arc<ThroughputCounters>,
) -> tokio::task::JoinHandle<PipelineResult<()>>
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut writer = BufWriter::new(writer);
        let mut failure = write_line(&mut writer, OUTPUT_HEADER).await.err();
        let mut pending: u64 = 0;

        loop {
            let result = match channel.try_pop() {
                Some(result) => result,
                None => {
                    // 次の結果を待つ前に、溜まっている行を出力先へ渡す
                    if failure.is_none() && pending > 0 {
                        failure = flush_pending(&mut writer, &counters, &mut pending)
                            .await
                            .err();
                        if let Some(error) = &failure {
                            tracing::error!(%error, "sink flush failed, discarding remaining results");
                        }
                    }
                    match channel.pop().await {
                        Some(result) => result,
                        None => break,
                    }
                }
            };

            if failure.is_some() {
                // 破棄して排出だけ続ける
                continue;
            }

            match write_line(&mut writer, &format_result(&result)).await {
                Ok(()) => {
                    pending += 1;
                    if pending >= FLUSH_BATCH {
                        failure = flush_pending(&mut writer, &counters, &mut pending)
                            .await
                            .err();
                    }
                }
                Err(error) => failure = Some(error),
            }

            if let Some(error) = &failure {
                tracing::error!(%error, "sink write failed, discarding remaining results");
            }
        }

        if failure.is_none() {
            failure = flush_pending(&mut writer, &counters, &mut pending)
                .await
                .err();
        }

        match failure {
            Some(error) => Err(error),
            None => {
                tracing::debug!(lines_written = counters.lines_written(), "sink drain finished");
                Ok(())
            }
        }
    })
}

/// `id,delivery_price` 形式の1行（改行なし）
pub fn format_result(result: &CalculationResult) -> String {
    format!("{},{}", result.id, result.delivery_price)
}

/// バッファをフラッシュし、成功した場合だけ溜まっていた行を数える
async fn flush_pending<W>(
    writer: &mut W,
    counters: &ThroughputCounters,
    pending: &mut u64,
) -> PipelineResult<()>
where
    W: AsyncWrite + Unpin,
{
    writer
        .flush()
        .await
        .map_err(|e| PipelineError::io("flushing output", e))?;
    counters.record_written(*pending);
    *pending = 0;
    Ok(())
}

async fn write_line<W>(writer: &mut W, line: &str) -> PipelineResult<()>
where
    W: AsyncWrite + Unpin,
{
    writer
        .write_all(line.as_bytes())
        .await
        .map_err(|e| PipelineError::io("writing output", e))?;
    writer
        .write_all(b"\n")
        .await
        .map_err(|e| PipelineError::io("writing output", e))
}
