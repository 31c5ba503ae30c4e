// パイプライン専用のカスタムエラー型定義

use thiserror::Error;

/// 価格計算エンジンが返すエラー
///
/// 1つのワーカー・1つのアイテムに閉じたエラーで、パイプライン全体は止めない。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PricingError {
    #[error("不正な計測値: id={id} {field}={value}")]
    InvalidMeasurement {
        id: i64,
        field: &'static str,
        value: i64,
    },

    #[error("価格計算がオーバーフローしました: id={id}")]
    Overflow { id: i64 },

    #[error("未知の商品: id={id}")]
    UnknownGood { id: i64 },
}

/// パイプライン固有のエラー型
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("入力フォーマットエラー: {line}行目 - {reason}")]
    Format { line: usize, reason: String },

    #[error("価格計算エラー: {0}")]
    Pricing(#[from] PricingError),

    #[error("設定エラー: {message}")]
    Configuration { message: String },

    #[error("I/Oエラー: {context} - {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("チャンネルエラー: {channel} は既に閉じられています")]
    ChannelClosed { channel: &'static str },

    #[error("タスクエラー: {source}")]
    Task {
        #[source]
        source: tokio::task::JoinError,
    },
}

impl PipelineError {
    /// フォーマットエラーの作成
    pub fn format(line: usize, reason: impl Into<String>) -> Self {
        Self::Format {
            line,
            reason: reason.into(),
        }
    }

    /// 設定エラーの作成
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// I/Oエラーの作成
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// チャンネル誤用エラーの作成
    pub fn channel_closed(channel: &'static str) -> Self {
        Self::ChannelClosed { channel }
    }

    /// タスクエラーの作成
    pub fn task(source: tokio::task::JoinError) -> Self {
        Self::Task { source }
    }

    /// 実行全体を失敗させるエラーかどうか
    ///
    /// 価格計算エラーだけが1ワーカーに閉じる。
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Pricing(_))
    }

    /// フォーマットエラーの行番号
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Format { line, .. } => Some(*line),
            _ => None,
        }
    }
}

/// パイプライン用のResult型エイリアス
pub type PipelineResult<T> = Result<T, PipelineError>;
