// 価格計算機能
// 寸法と重量から配送価格を算出する

pub mod implementations;

// 公開API
pub use implementations::VolumetricPriceCalculator;
