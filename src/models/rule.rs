use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

/// 关联规则: antecedent => consequent (编码升序)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssociationRule {
    pub antecedent: Vec<i64>,
    pub consequent: Vec<i64>,
    pub antecedent_support: f64,
    pub consequent_support: f64,
    /// P(antecedent ∪ consequent)
    pub support: f64,
    /// P(consequent | antecedent)
    pub confidence: f64,
    pub lift: f64,
}

impl AssociationRule {
    /// 规则两侧任意一侧包含该商品 (集合成员判断)
    pub fn involves(&self, product_code: i64) -> bool {
        self.antecedent.contains(&product_code) || self.consequent.contains(&product_code)
    }
}

/// 交叉销售结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "rules", rename_all = "snake_case")]
pub enum CrossSellOutcome {
    /// 挖掘不到任何频繁项集
    NoFrequentItemsets,
    /// 有规则, 但没有一条涉及查询商品
    NoRulesForProduct,
    Rules(Vec<AssociationRule>),
}

impl CrossSellOutcome {
    pub fn rules(&self) -> &[AssociationRule] {
        match self {
            CrossSellOutcome::Rules(rules) => rules,
            _ => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rules().is_empty()
    }
}

/// 格式化后的规则行 (支持度/置信度为百分比字符串)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattedRule {
    pub antecedent_code: i64,
    pub antecedent_description: String,
    pub consequent_code: i64,
    pub consequent_description: String,
    pub consequent_unit_price: BigDecimal,
    pub consequent_margin_pct: f64,
    pub consequent_stock: i64,
    /// 两个商品同时出现的发票占比, 如 "12.34%"
    pub support: String,
    /// 买了前件的发票里也买了后件的比例
    pub confidence: String,
    pub lift: f64,
}
