//! 配送価格計算パイプライン
//!
//! 入力CSVの貨物レコードを容量固定のチャンネル経由でワーカープールへ流し、
//! 計算した配送価格を出力CSVへ書き出す。ワーカー数は実行中に変更できる。

pub mod channel;
pub mod cli;
pub mod core;
pub mod engine;
pub mod services;

// 公開API
pub use crate::channel::BoundedChannel;
pub use crate::core::{
    CalculationResult, GoodRecord, PipelineCommand, PipelineConfig, PipelineError,
    PipelineResult, PipelineSummary, PricingEngine, PricingError, ProgressReporter,
    ProgressSnapshot,
};
pub use crate::engine::{PipelineControl, PipelineOrchestrator};
pub use crate::services::{
    AppSettings, ConsoleProgressReporter, NoOpProgressReporter, PriceCalculatorAppOptions,
    PriceCalculatorOptions, TracingProgressReporter, VolumetricPriceCalculator,
};
