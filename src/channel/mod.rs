//! 容量固定のFIFOチャンネル
//!
//! tokioの `mpsc` をベースに、複数コンシューマーからの `pop` と
//! 書き込み側からの明示的な `close` を提供する。
//!
//! - `push` はキューが満杯の間、呼び出し元のタスクだけをブロックする
//! - `pop` はキューが空かつ未クローズの間ブロックし、
//!   クローズ後は残りを排出してから `None`（枯渇シグナル）を返す
//! - `close` は冪等

use crate::core::{PipelineError, PipelineResult};
use parking_lot::Mutex;
use tokio::sync::mpsc;

/// 容量固定のブロッキングチャンネル
pub struct BoundedChannel<T> {
    name: &'static str,
    capacity: usize,
    sender: Mutex<Option<mpsc::Sender<T>>>,
    receiver: tokio::sync::Mutex<mpsc::Receiver<T>>,
}

impl<T: Send> BoundedChannel<T> {
    /// 新しいチャンネルを作成
    ///
    /// `capacity` は0より大きい必要がある（呼び出し側で設定検証済みの前提）。
    pub fn new(name: &'static str, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity);
        Self {
            name,
            capacity,
            sender: Mutex::new(Some(tx)),
            receiver: tokio::sync::Mutex::new(rx),
        }
    }

    /// アイテムを追加。満杯の間は空きが出るまで待機する
    ///
    /// クローズ後の `push` はオーケストレーターの順序契約違反なので
    /// `ChannelClosed` を返す。
    pub async fn push(&self, item: T) -> PipelineResult<()> {
        // ロックを保持したまま await しないよう、送信側をクローンしてから送る
        let sender = self
            .sender
            .lock()
            .clone()
            .ok_or_else(|| PipelineError::channel_closed(self.name))?;

        sender
            .send(item)
            .await
            .map_err(|_| PipelineError::channel_closed(self.name))
    }

    /// 次のアイテムを取得。枯渇したら `None`
    ///
    /// キャンセルセーフ: `select!` で破棄されてもアイテムは失われない。
    pub async fn pop(&self) -> Option<T> {
        let mut rx = self.receiver.lock().await;
        rx.recv().await
    }

    /// 待たずに取り出せるアイテムがあれば返す
    ///
    /// キューが空の場合や、他のコンシューマーが `pop` 中の場合は `None`。
    /// 枯渇の判定には使えない。
    pub fn try_pop(&self) -> Option<T> {
        self.receiver.try_lock().ok()?.try_recv().ok()
    }

    /// 書き込み側を閉じる（冪等）
    ///
    /// 進行中の `push` は完了し、その後 `pop` が残りを排出してから枯渇を返す。
    pub fn close(&self) {
        if self.sender.lock().take().is_some() {
            tracing::debug!(channel = self.name, "channel closed");
        }
    }

    /// 書き込み側が閉じられているか
    pub fn is_closed(&self) -> bool {
        self.sender.lock().is_none()
    }

    /// 設定された容量
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// チャンネル名（ログ用）
    pub fn name(&self) -> &'static str {
        self.name
    }
}
