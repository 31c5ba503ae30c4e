//! 実行中にサイズを変更できるワーカープール
//!
//! ワーカーは入力チャンネルから [`GoodRecord`] を取り出し、価格計算エンジンを
//! 呼び出して [`CalculationResult`] を出力チャンネルへ送る。
//!
//! ロスターと `input_exhausted` フラグは1つのミューテックスで保護し、
//! リサイズは「フラグ確認 → 生成/キャンセル」をロック内で原子的に行う。
//! 生成した全タスクは [`JoinSet`] に保持されるため、`join_all` が
//! 後から追加されたワーカーを取りこぼすことはない。

use super::counters::ThroughputCounters;
use crate::{
    channel::BoundedChannel,
    core::{
        CalculationResult, GoodRecord, PipelineError, PipelineResult, PricingEngine,
        ProgressReporter, ResizeOutcome, WorkerExit,
    },
};
use parking_lot::Mutex;
use rand::Rng;
use std::{cmp::Ordering, collections::VecDeque, ops::RangeInclusive, sync::Arc};
use tokio::{task::JoinSet, time::Duration};
use tokio_util::sync::CancellationToken;

type WorkerOutcome = (usize, PipelineResult<WorkerExit>);

/// ワーカーが共有する依存関係
pub struct WorkerContext<P> {
    pub input: Arc<BoundedChannel<GoodRecord>>,
    pub output: Arc<BoundedChannel<CalculationResult>>,
    pub engine: Arc<P>,
    pub counters: Arc<ThroughputCounters>,
    /// 価格計算エラーで止まったワーカーを終了時点で報告する
    pub reporter: Arc<dyn ProgressReporter>,
    pub simulated_latency_ms: Option<RangeInclusive<u64>>,
}

/// ロスター上の1ワーカー
struct WorkerHandle {
    id: usize,
    cancel: CancellationToken,
}

#[derive(Default)]
struct Roster {
    // 古い順
    active: VecDeque<WorkerHandle>,
    tasks: JoinSet<WorkerOutcome>,
    input_exhausted: bool,
    next_id: usize,
    spawned: usize,
    cancelled: usize,
}

/// `join_all` の結果
#[derive(Debug, Default)]
pub struct PoolReport {
    pub workers_spawned: usize,
    pub workers_cancelled: usize,
    /// 価格計算エラーで終了したワーカー
    pub failures: Vec<(usize, PipelineError)>,
}

/// 動的にリサイズ可能なワーカープール
pub struct WorkerPool<P> {
    context: Arc<WorkerContext<P>>,
    roster: Arc<Mutex<Roster>>,
}

impl<P> WorkerPool<P>
where
    P: PricingEngine + 'static,
{
    /// ワーカー0人のプールを作成
    pub fn new(context: WorkerContext<P>) -> Self {
        Self {
            context: Arc::new(context),
            roster: Arc::new(Mutex::new(Roster::default())),
        }
    }

    /// ワーカー数を `target` に合わせる
    ///
    /// 入力枯渇後は何もしない。縮小時は古いワーカーから順にキャンセルを通知し、
    /// 終了は待たない（各ワーカーが次のループ境界で自発的に抜ける）。
    pub fn resize_to(&self, target: usize) -> ResizeOutcome {
        let mut roster = self.roster.lock();

        if roster.input_exhausted {
            tracing::debug!(target, "resize ignored: input already exhausted");
            return ResizeOutcome::Ignored;
        }

        let current = roster.active.len();
        let outcome = match target.cmp(&current) {
            Ordering::Equal => ResizeOutcome::Unchanged,
            Ordering::Greater => {
                for _ in current..target {
                    self.spawn_worker(&mut roster);
                }
                ResizeOutcome::Grown {
                    spawned: target - current,
                }
            }
            Ordering::Less => {
                let mut cancelled = 0;
                while roster.active.len() > target {
                    let Some(handle) = roster.active.pop_front() else {
                        break;
                    };
                    handle.cancel.cancel();
                    tracing::debug!(worker_id = handle.id, "worker cancellation requested");
                    cancelled += 1;
                }
                roster.cancelled += cancelled;
                ResizeOutcome::Shrunk { cancelled }
            }
        };

        tracing::info!(from = current, to = target, ?outcome, "worker pool resized");
        outcome
    }

    /// 入力の枯渇を記録。以降の `resize_to` は何もしない
    pub fn mark_input_exhausted(&self) {
        self.roster.lock().input_exhausted = true;
    }

    /// ロスター上のワーカー数
    pub fn active_workers(&self) -> usize {
        self.roster.lock().active.len()
    }

    /// これまでに生成した全ワーカーの終了を待つ
    ///
    /// 価格計算エラーは `PoolReport::failures` に集め、それ以外のエラー
    /// （チャンネル誤用・パニック）は全ワーカーの終了後に返す。
    pub async fn join_all(&self) -> PipelineResult<PoolReport> {
        let mut failures = Vec::new();
        let mut fatal: Option<PipelineError> = None;

        loop {
            let mut tasks = std::mem::take(&mut self.roster.lock().tasks);
            if tasks.is_empty() {
                break;
            }

            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok((_, Ok(_))) => {}
                    Ok((worker_id, Err(error))) if !error.is_fatal() => {
                        failures.push((worker_id, error));
                    }
                    Ok((_, Err(error))) => {
                        fatal.get_or_insert(error);
                    }
                    Err(join_error) => {
                        fatal.get_or_insert(PipelineError::task(join_error));
                    }
                }
            }
        }

        if let Some(error) = fatal {
            return Err(error);
        }

        let roster = self.roster.lock();
        Ok(PoolReport {
            workers_spawned: roster.spawned,
            workers_cancelled: roster.cancelled,
            failures,
        })
    }

    fn spawn_worker(&self, roster: &mut Roster) {
        let worker_id = roster.next_id;
        roster.next_id += 1;
        roster.spawned += 1;

        let cancel = CancellationToken::new();
        roster.active.push_back(WorkerHandle {
            id: worker_id,
            cancel: cancel.clone(),
        });

        let context = Arc::clone(&self.context);
        let shared_roster = Arc::clone(&self.roster);
        roster.tasks.spawn(async move {
            tracing::trace!(worker_id, "worker started");
            let outcome = worker_loop(worker_id, &context, &cancel).await;

            // 正常終了・エラー終了したワーカーは自分でロスターから外れる
            shared_roster.lock().active.retain(|handle| handle.id != worker_id);

            match &outcome {
                Ok(exit) => tracing::debug!(worker_id, ?exit, "worker stopped"),
                Err(error) if !error.is_fatal() => {
                    tracing::warn!(worker_id, %error, "worker stopped by pricing error");
                    context
                        .reporter
                        .report_error(worker_id, &error.to_string())
                        .await;
                }
                Err(error) => tracing::error!(worker_id, %error, "worker failed"),
            }
            (worker_id, outcome)
        });

        tracing::debug!(worker_id, "worker spawned");
    }
}

/// 1ワーカーのメインループ
///
/// キャンセルはアイテムの取り出し前にだけ確認する。取り出し済みのアイテムは
/// キャンセルされていても最後まで処理して出力へ送る。
async fn worker_loop<P>(
    worker_id: usize,
    context: &WorkerContext<P>,
    cancel: &CancellationToken,
) -> PipelineResult<WorkerExit>
where
    P: PricingEngine,
{
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(WorkerExit::Cancelled),
            next = context.input.pop() => next,
        };

        let Some(good) = next else {
            return Ok(WorkerExit::Exhausted);
        };

        let price = context.engine.calculate_price(&good)?;

        if let Some(range) = &context.simulated_latency_ms {
            let delay = rand::rng().random_range(range.clone());
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        context
            .output
            .push(CalculationResult::new(good.id, price))
            .await?;
        context.counters.record_computed();

        tracing::trace!(worker_id, id = good.id, "item priced");
    }
}
