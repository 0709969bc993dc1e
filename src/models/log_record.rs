use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 替代品日志表 (product_substitutes)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubstituteLogRecord {
    pub queried_code: String,
    pub queried_description: String,
    pub recommended_code: String,
    pub recommended_description: String,
    pub unit_price: BigDecimal,
    pub margin_pct: f64,
    pub stock_quantity: i64,
    pub category: String,
    pub inserted_at: DateTime<Utc>,
}

/// 关联商品日志表 (product_associations)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssociationLogRecord {
    pub queried_code: String,
    pub queried_description: String,
    pub associated_code: String,
    pub associated_description: String,
    /// 百分比数值, 如 12.34
    pub support: f64,
    pub confidence: f64,
    pub inserted_at: DateTime<Utc>,
}
