// SourceFeed - 入力レコードの読み込みと配信

use crate::{
    channel::BoundedChannel,
    core::{GoodRecord, PipelineError, PipelineResult},
};
use std::{str::FromStr, sync::Arc};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use super::counters::ThroughputCounters;

/// SourceFeed: 入力を解析して入力チャンネルへ配信
///
/// 成功・失敗どちらの経路でも、終了時に必ずチャンネルを閉じる。
pub fn spawn_source_feed<R>(
    reader: R,
    channel: Arc<BoundedChannel<GoodRecord>>,
    counters: Arc<ThroughputCounters>,
) -> tokio::task::JoinHandle<PipelineResult<()>>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let result = feed_records(reader, &channel, &counters).await;
        channel.close();

        match &result {
            Ok(()) => tracing::debug!(lines_read = counters.lines_read(), "source feed finished"),
            Err(error) => tracing::error!(%error, "source feed aborted"),
        }
        result
    })
}

async fn feed_records<R>(
    reader: R,
    channel: &BoundedChannel<GoodRecord>,
    counters: &ThroughputCounters,
) -> PipelineResult<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();

    // 1行目はヘッダー
    let mut line_number = 1;
    if next_line(&mut lines, line_number).await?.is_none() {
        return Ok(());
    }

    loop {
        line_number += 1;
        let Some(line) = next_line(&mut lines, line_number).await? else {
            break;
        };

        let record = parse_record(&line, line_number)?;
        counters.record_read();
        channel.push(record).await?;
    }

    Ok(())
}

async fn next_line<R>(
    lines: &mut tokio::io::Lines<R>,
    line_number: usize,
) -> PipelineResult<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    lines.next_line().await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::InvalidData {
            PipelineError::format(line_number, "line is not valid UTF-8")
        } else {
            PipelineError::io(format!("reading input line {line_number}"), e)
        }
    })
}

/// 1行を `GoodRecord` に変換
///
/// カラム順は `id, height, length, width, weight`。空のカラムは詰める。
/// `line_number` は入力全体での1始まりの行番号（ヘッダーが1行目）。
pub fn parse_record(line: &str, line_number: usize) -> PipelineResult<GoodRecord> {
    let tokens: Vec<&str> = line
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .collect();

    if tokens.len() != GoodRecord::ARITY {
        return Err(PipelineError::format(
            line_number,
            format!(
                "{} columns are presented, but {} are expected",
                tokens.len(),
                GoodRecord::ARITY
            ),
        ));
    }

    Ok(GoodRecord {
        id: parse_field(tokens[0], "id", line_number)?,
        height: parse_field(tokens[1], "height", line_number)?,
        length: parse_field(tokens[2], "length", line_number)?,
        width: parse_field(tokens[3], "width", line_number)?,
        weight: parse_field(tokens[4], "weight", line_number)?,
    })
}

fn parse_field<T>(token: &str, field: &str, line_number: usize) -> PipelineResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    token.parse().map_err(|e| {
        PipelineError::format(line_number, format!("column `{field}` ({token:?}): {e}"))
    })
}
