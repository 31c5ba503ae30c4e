// サービス層 - パイプラインに注入される具象コラボレーター
// 各サービスは core のトレイトを実装し、エンジン層からは疎結合

pub mod config;
pub mod monitoring;
pub mod pricing;

// 公開API
pub use config::{AppSettings, PriceCalculatorAppOptions, PriceCalculatorOptions};
pub use monitoring::{ConsoleProgressReporter, NoOpProgressReporter, TracingProgressReporter};
pub use pricing::VolumetricPriceCalculator;
