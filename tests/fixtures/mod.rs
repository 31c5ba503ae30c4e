// 統合テスト用のヘルパーとテストダブル

pub mod mocks;

pub use mocks::*;

use price_calculator::{AppSettings, PriceCalculatorAppOptions, PriceCalculatorOptions};
use std::{collections::HashMap, io::Cursor, path::Path};

pub const INPUT_HEADER: &str = "id,height,length,width,weight";

pub type Record = (i64, i32, i32, i32, i32);

/// `(id, height, length, width, weight)` の列から入力CSVを組み立てる
pub fn input_csv(records: &[Record]) -> String {
    let mut text = format!("{INPUT_HEADER}\n");
    for (id, height, length, width, weight) in records {
        text.push_str(&format!("{id},{height},{length},{width},{weight}\n"));
    }
    text
}

/// idごとに寸法を変えた `count` 件のレコード
pub fn generated_records(count: i64) -> Vec<Record> {
    (1..=count)
        .map(|id| {
            let n = id as i32;
            (id, n % 40 + 1, n % 13 + 2, n % 7 + 3, (n * 37) % 5000)
        })
        .collect()
}

pub fn input_reader(text: String) -> Cursor<Vec<u8>> {
    Cursor::new(text.into_bytes())
}

/// 出力CSVをヘッダーと `id -> 価格文字列` に分解する
pub fn parse_output(output: &str) -> (String, HashMap<i64, String>) {
    let mut lines = output.lines();
    let header = lines.next().unwrap_or_default().to_string();
    let mut prices = HashMap::new();
    for line in lines {
        let (id, price) = line.split_once(',').expect("two columns");
        let previous = prices.insert(id.parse().expect("numeric id"), price.to_string());
        assert!(previous.is_none(), "duplicate output line for id {id}");
    }
    (header, prices)
}

pub fn app_options(parallelism_degree: usize) -> PriceCalculatorAppOptions {
    PriceCalculatorAppOptions::default()
        .with_parallelism_degree(parallelism_degree)
        .with_channel_bounds(8, 8)
        .with_progress_interval_ms(20)
}

/// 設定ファイルを書き出す
pub fn write_settings(path: &Path, options: PriceCalculatorAppOptions) {
    let settings = AppSettings {
        price_calculator_app_options: options,
        price_calculator_options: PriceCalculatorOptions::default(),
    };
    std::fs::write(path, serde_json::to_string_pretty(&settings).unwrap()).unwrap();
}
