// 設定管理機能
// 設定ファイルの読み込み・検証と、実行中の変更監視

pub mod implementations;
pub mod watcher;

// 公開API
pub use implementations::{
    AppSettings, LatencyRange, PriceCalculatorAppOptions, PriceCalculatorOptions,
    DEFAULT_SETTINGS_FILE,
};
pub use watcher::spawn_config_watcher;
