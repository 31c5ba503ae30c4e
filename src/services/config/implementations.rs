// 設定管理の具象実装

use crate::core::{PipelineConfig, PipelineError, PipelineResult};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{
    ops::RangeInclusive,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

/// 設定ファイルのデフォルト名
pub const DEFAULT_SETTINGS_FILE: &str = "appsettings.json";

/// 設定ファイル全体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AppSettings {
    pub price_calculator_app_options: PriceCalculatorAppOptions,
    #[serde(default)]
    pub price_calculator_options: PriceCalculatorOptions,
}

impl AppSettings {
    /// JSON文字列から読み込み、検証する
    pub fn from_json_str(content: &str) -> PipelineResult<Self> {
        let settings: Self = serde_json::from_str(content)
            .map_err(|e| PipelineError::configuration(format!("設定ファイルの解析に失敗: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }

    /// ファイルから読み込む
    ///
    /// 相対パスの入出力ファイル名は設定ファイルのディレクトリ基準で解決する。
    pub fn load(path: &Path) -> PipelineResult<Self> {
        Self::load_with_content(path).map(|(settings, _)| settings)
    }

    /// ファイルから読み込み、読んだ内容もそのまま返す
    ///
    /// 変更監視の比較元として、検証に使った内容と同じものを渡すために使う。
    pub fn load_with_content(path: &Path) -> PipelineResult<(Self, String)> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PipelineError::io(format!("reading {}", path.display()), e))?;
        let mut settings = Self::from_json_str(&content)?;
        if let Some(base) = path.parent() {
            settings.price_calculator_app_options.resolve_paths(base);
        }
        Ok((settings, content))
    }

    pub fn validate(&self) -> PipelineResult<()> {
        self.price_calculator_app_options.validate()?;
        self.price_calculator_options.validate()
    }
}

/// 擬似計算時間の範囲（ミリ秒）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LatencyRange {
    pub min: u64,
    pub max: u64,
}

/// パイプラインの設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PriceCalculatorAppOptions {
    #[serde(default = "default_parallelism_degree")]
    pub parallelism_degree: usize,
    pub reader_channel_bound: usize,
    pub writer_channel_bound: usize,
    pub input_file_name: PathBuf,
    pub output_file_name: PathBuf,
    #[serde(default = "default_progress_interval_ms")]
    pub progress_interval_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simulated_latency_ms: Option<LatencyRange>,
}

fn default_parallelism_degree() -> usize {
    num_cpus::get().max(1)
}

fn default_progress_interval_ms() -> u64 {
    1000
}

impl PriceCalculatorAppOptions {
    pub fn with_parallelism_degree(mut self, parallelism_degree: usize) -> Self {
        self.parallelism_degree = parallelism_degree;
        self
    }

    pub fn with_channel_bounds(mut self, reader: usize, writer: usize) -> Self {
        self.reader_channel_bound = reader;
        self.writer_channel_bound = writer;
        self
    }

    pub fn with_input_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_file_name = path.into();
        self
    }

    pub fn with_output_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_file_name = path.into();
        self
    }

    pub fn with_progress_interval_ms(mut self, interval_ms: u64) -> Self {
        self.progress_interval_ms = interval_ms;
        self
    }

    pub fn with_simulated_latency_ms(mut self, min: u64, max: u64) -> Self {
        self.simulated_latency_ms = Some(LatencyRange { min, max });
        self
    }

    /// 相対パスを `base` 基準に解決
    pub fn resolve_paths(&mut self, base: &Path) {
        if self.input_file_name.is_relative() {
            self.input_file_name = base.join(&self.input_file_name);
        }
        if self.output_file_name.is_relative() {
            self.output_file_name = base.join(&self.output_file_name);
        }
    }

    pub fn validate(&self) -> PipelineResult<()> {
        if self.reader_channel_bound == 0 {
            return Err(PipelineError::configuration(
                "ReaderChannelBound は1以上である必要があります",
            ));
        }
        if self.writer_channel_bound == 0 {
            return Err(PipelineError::configuration(
                "WriterChannelBound は1以上である必要があります",
            ));
        }
        if self.progress_interval_ms == 0 {
            return Err(PipelineError::configuration(
                "ProgressIntervalMs は1以上である必要があります",
            ));
        }
        if let Some(range) = self.simulated_latency_ms {
            if range.min > range.max {
                return Err(PipelineError::configuration(format!(
                    "SimulatedLatencyMs の Min ({}) が Max ({}) を超えています",
                    range.min, range.max
                )));
            }
        }
        Ok(())
    }
}

impl Default for PriceCalculatorAppOptions {
    fn default() -> Self {
        Self {
            parallelism_degree: default_parallelism_degree(),
            reader_channel_bound: 100,
            writer_channel_bound: 100,
            input_file_name: PathBuf::from("input.csv"),
            output_file_name: PathBuf::from("output.csv"),
            progress_interval_ms: default_progress_interval_ms(),
            simulated_latency_ms: None,
        }
    }
}

impl PipelineConfig for PriceCalculatorAppOptions {
    fn parallelism_degree(&self) -> usize {
        self.parallelism_degree
    }

    fn reader_channel_bound(&self) -> usize {
        self.reader_channel_bound
    }

    fn writer_channel_bound(&self) -> usize {
        self.writer_channel_bound
    }

    fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }

    fn simulated_latency_ms(&self) -> Option<RangeInclusive<u64>> {
        self.simulated_latency_ms.map(|range| range.min..=range.max)
    }
}

/// 価格計算エンジンの係数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PriceCalculatorOptions {
    #[serde(
        default = "default_volume_to_price_ratio",
        serialize_with = "serialize_ratio",
        deserialize_with = "deserialize_ratio"
    )]
    pub volume_to_price_ratio: Decimal,
    #[serde(
        default = "default_weight_to_price_ratio",
        serialize_with = "serialize_ratio",
        deserialize_with = "deserialize_ratio"
    )]
    pub weight_to_price_ratio: Decimal,
}

fn default_volume_to_price_ratio() -> Decimal {
    Decimal::new(327, 2)
}

fn default_weight_to_price_ratio() -> Decimal {
    Decimal::new(134, 2)
}

// 係数は設定ファイル上では数値として扱う
fn serialize_ratio<S>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let value = value
        .to_f64()
        .ok_or_else(|| serde::ser::Error::custom("ratio is out of range"))?;
    serializer.serialize_f64(value)
}

// JSONの数値をそのままの10進表記でDecimalにする
fn deserialize_ratio<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    Decimal::from_str(&value.to_string()).map_err(serde::de::Error::custom)
}

impl PriceCalculatorOptions {
    pub fn validate(&self) -> PipelineResult<()> {
        if self.volume_to_price_ratio.is_sign_negative() || self.weight_to_price_ratio.is_sign_negative()
        {
            return Err(PipelineError::configuration(
                "価格係数は0以上である必要があります",
            ));
        }
        Ok(())
    }
}

impl Default for PriceCalculatorOptions {
    fn default() -> Self {
        Self {
            volume_to_price_ratio: default_volume_to_price_ratio(),
            weight_to_price_ratio: default_weight_to_price_ratio(),
        }
    }
}
