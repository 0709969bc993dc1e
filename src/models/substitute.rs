use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

/// 商品目录条目 (按商品编码去重后的首行)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub product_code: i64,
    pub description: String,
    pub category_code: i64,
    pub category_name: String,
    pub brand_name: String,
    pub unit_price: BigDecimal,
    pub margin_pct: f64,
    pub stock_quantity: i64,
}

/// 替代品推荐结果行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubstituteRow {
    pub product_code: i64,
    pub description: String,
    /// 保留两位小数
    pub unit_price: BigDecimal,
    /// 百分比 (×100), 保留两位小数
    pub margin_pct: f64,
    pub brand: Option<String>,
    pub stock_quantity: i64,
    pub category: String,
    /// 与参考商品的加权距离, 仅商品模式有值
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

/// 查询编码的解析结果
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// 命中商品编码
    Found(CatalogEntry),
    /// 命中品类编码
    CategoryOnly(i64),
    Unresolved,
}

/// 降级到全局随机推荐的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// 编码既不是商品也不是品类
    UnknownCode,
    /// 商品存在, 但同品类没有其他有库存商品
    NoSubstitutesInCategory,
    /// 品类存在, 但品类内没有有库存商品
    NoStockInCategory,
}

/// 替代品推荐结果 (三级降级: 商品 → 品类 → 全局)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SubstituteOutcome {
    /// 商品模式: 按价格/毛利距离排序
    Substitutes {
        reference: CatalogEntry,
        rows: Vec<SubstituteRow>,
    },
    /// 品类模式: 品类内随机抽样
    CategorySample {
        category_code: i64,
        rows: Vec<SubstituteRow>,
    },
    /// 全局随机抽样
    Alternatives {
        reason: FallbackReason,
        rows: Vec<SubstituteRow>,
    },
}

impl SubstituteOutcome {
    pub fn rows(&self) -> &[SubstituteRow] {
        match self {
            SubstituteOutcome::Substitutes { rows, .. }
            | SubstituteOutcome::CategorySample { rows, .. }
            | SubstituteOutcome::Alternatives { rows, .. } => rows,
        }
    }

    /// 给调用方/日志看的诊断信息
    pub fn notice(&self) -> String {
        match self {
            SubstituteOutcome::Substitutes { reference, rows } if reference.stock_quantity > 0 => {
                format!(
                    "Product {} is in stock ({} units); {} similar products listed",
                    reference.product_code,
                    reference.stock_quantity,
                    rows.len()
                )
            }
            SubstituteOutcome::Substitutes { reference, rows } => format!(
                "{} substitutes for product {} ranked by price/margin proximity",
                rows.len(),
                reference.product_code
            ),
            SubstituteOutcome::CategorySample { category_code, rows } => format!(
                "{} in-stock products sampled from category {}",
                rows.len(),
                category_code
            ),
            SubstituteOutcome::Alternatives { reason, rows } => {
                let why = match reason {
                    FallbackReason::UnknownCode => "code not found as product or category",
                    FallbackReason::NoSubstitutesInCategory => {
                        "no in-stock substitutes in the product's category"
                    }
                    FallbackReason::NoStockInCategory => "no in-stock products in the category",
                };
                format!("{}; {} in-stock alternatives sampled", why, rows.len())
            }
        }
    }
}
