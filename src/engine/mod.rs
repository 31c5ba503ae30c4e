// エンジン層 - パイプラインの各ステージとオーケストレーション
// SourceFeed → WorkerPool → SinkDrain を ProgressMonitor が監視する

pub mod counters;
pub mod monitor;
pub mod orchestrator;
pub mod pool;
pub mod sink;
pub mod source;

// 公開API
pub use counters::ThroughputCounters;
pub use orchestrator::{PipelineControl, PipelineOrchestrator};
pub use pool::{PoolReport, WorkerContext, WorkerPool};
pub use sink::{format_result, OUTPUT_HEADER};
pub use source::parse_record;
