// 価格計算エンジンの具象実装

use crate::core::{GoodRecord, PricingEngine, PricingError};
use crate::services::config::PriceCalculatorOptions;
use rust_decimal::Decimal;

/// 体積・重量ベースの配送価格計算
///
/// 体積価格と重量価格を比べ、高い方を配送価格とする。
/// 体積は `height * length * width / 1000`、重量は `weight / 1000` で換算する。
#[derive(Debug, Clone, PartialEq)]
pub struct VolumetricPriceCalculator {
    volume_to_price_ratio: Decimal,
    weight_to_price_ratio: Decimal,
}

impl VolumetricPriceCalculator {
    pub fn new(volume_to_price_ratio: Decimal, weight_to_price_ratio: Decimal) -> Self {
        Self {
            volume_to_price_ratio,
            weight_to_price_ratio,
        }
    }

    pub fn from_options(options: &PriceCalculatorOptions) -> Self {
        Self::new(options.volume_to_price_ratio, options.weight_to_price_ratio)
    }

    fn price_by_volume(&self, good: &GoodRecord) -> Option<Decimal> {
        Decimal::from(good.height)
            .checked_mul(Decimal::from(good.length))?
            .checked_mul(Decimal::from(good.width))?
            .checked_div(Decimal::ONE_THOUSAND)?
            .checked_mul(self.volume_to_price_ratio)
    }

    fn price_by_weight(&self, good: &GoodRecord) -> Option<Decimal> {
        Decimal::from(good.weight)
            .checked_div(Decimal::ONE_THOUSAND)?
            .checked_mul(self.weight_to_price_ratio)
    }
}

impl Default for VolumetricPriceCalculator {
    fn default() -> Self {
        Self::from_options(&PriceCalculatorOptions::default())
    }
}

impl PricingEngine for VolumetricPriceCalculator {
    fn calculate_price(&self, good: &GoodRecord) -> Result<Decimal, PricingError> {
        let measurements = [
            ("height", good.height),
            ("length", good.length),
            ("width", good.width),
            ("weight", good.weight),
        ];
        if let Some((field, value)) = measurements.into_iter().find(|(_, value)| *value < 0) {
            return Err(PricingError::InvalidMeasurement {
                id: good.id,
                field,
                value: i64::from(value),
            });
        }

        let overflow = || PricingError::Overflow { id: good.id };
        let volume_price = self.price_by_volume(good).ok_or_else(overflow)?;
        let weight_price = self.price_by_weight(good).ok_or_else(overflow)?;

        Ok(volume_price.max(weight_price).normalize())
    }
}
