use crate::error::{AppError, AppResult};
use bigdecimal::{BigDecimal, Zero};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 交易明细行 (一张发票上售出的一个商品)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRow {
    pub invoice_id: String,
    pub sale_date: NaiveDate,
    pub product_code: i64,
    pub product_description: String,
    pub category_code: i64,
    pub category_name: String,
    pub brand_code: i64,
    pub brand_name: String,
    pub quantity_sold: i64,
    pub unit_price: BigDecimal,
    pub unit_cost: BigDecimal,
    pub stock_quantity: i64,
    pub line_total: BigDecimal,
    pub invoice_total: BigDecimal,
    pub gross_margin: BigDecimal,
    pub margin_pct: f64,
}

/// 清洗后的交易表 (只读快照)
///
/// 构造时校验: 每个商品编码只对应一个描述/品类/品牌, 数值范围合法。
/// 校验失败说明上游清洗有问题, 直接报错。
#[derive(Debug, Clone, Default)]
pub struct TransactionTable {
    rows: Vec<TransactionRow>,
}

impl TransactionTable {
    pub fn new(rows: Vec<TransactionRow>) -> AppResult<Self> {
        Self::validate(&rows)?;
        Ok(Self { rows })
    }

    fn validate(rows: &[TransactionRow]) -> AppResult<()> {
        let mut identities: HashMap<i64, (&str, i64, i64)> = HashMap::new();

        for (idx, row) in rows.iter().enumerate() {
            Self::check_ranges(idx, row)?;

            let identity = (
                row.product_description.as_str(),
                row.category_code,
                row.brand_code,
            );
            match identities.get(&row.product_code) {
                Some(seen) if *seen != identity => {
                    return Err(AppError::InvalidTable(format!(
                        "product {} maps to more than one description/category/brand",
                        row.product_code
                    )));
                }
                Some(_) => {}
                None => {
                    identities.insert(row.product_code, identity);
                }
            }
        }

        Ok(())
    }

    fn check_ranges(idx: usize, row: &TransactionRow) -> AppResult<()> {
        let zero = BigDecimal::zero();
        let violation = if row.quantity_sold < 0 {
            Some("quantity_sold < 0")
        } else if row.stock_quantity < 0 {
            Some("stock_quantity < 0")
        } else if row.unit_price < zero {
            Some("unit_price < 0")
        } else if row.unit_cost <= zero || row.unit_cost > row.unit_price {
            Some("unit_cost outside (0, unit_price]")
        } else {
            None
        };

        match violation {
            Some(what) => Err(AppError::InvalidTable(format!(
                "row {} (invoice {}, product {}): {}",
                idx, row.invoice_id, row.product_code, what
            ))),
            None => Ok(()),
        }
    }

    pub fn rows(&self) -> &[TransactionRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains_product(&self, product_code: i64) -> bool {
        self.rows.iter().any(|r| r.product_code == product_code)
    }

    pub fn contains_category(&self, category_code: i64) -> bool {
        self.rows.iter().any(|r| r.category_code == category_code)
    }
}
