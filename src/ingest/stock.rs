use crate::error::AppResult;
use serde::Deserialize;
use std::io::Read;

/// 库存文件原始行
#[derive(Debug, Deserialize)]
struct RawStockRecord {
    product_code: i64,
    product_description: String,
    category_code: i64,
    category_name: String,
    brand_code: i64,
    brand_name: String,
    stock_quantity: Option<f64>,
}

/// 清洗后的库存记录
#[derive(Debug, Clone, PartialEq)]
pub struct StockRecord {
    pub product_code: i64,
    pub product_description: String,
    pub category_code: i64,
    pub category_name: String,
    pub brand_code: i64,
    pub brand_name: String,
    pub stock_quantity: i64,
}

/// 读取库存 CSV; 缺失或负数库存按 0 处理
pub fn read_stock<R: Read>(reader: R) -> AppResult<Vec<StockRecord>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    let mut clamped = 0usize;
    for result in csv_reader.deserialize::<RawStockRecord>() {
        let raw = result?;
        let stock_quantity = match raw.stock_quantity {
            Some(q) if q > 0.0 => q.trunc() as i64,
            _ => {
                clamped += 1;
                0
            }
        };
        records.push(StockRecord {
            product_code: raw.product_code,
            product_description: raw.product_description,
            category_code: raw.category_code,
            category_name: raw.category_name,
            brand_code: raw.brand_code,
            brand_name: raw.brand_name,
            stock_quantity,
        });
    }

    tracing::info!(
        "Stock loaded: {} records, {} with empty/non-positive stock",
        records.len(),
        clamped
    );
    Ok(records)
}
