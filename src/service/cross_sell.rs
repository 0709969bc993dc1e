use crate::error::{AppError, AppResult};
use crate::models::{
    AssociationRule, CatalogEntry, CrossSellOutcome, FormattedRule, TransactionTable,
};
use crate::service::catalog::dedup_first;
use crate::service::mining::{association_rules, Apriori, OneHotBaskets};
use bigdecimal::{BigDecimal, Zero};
use indexmap::IndexMap;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

/// 规则里的商品在目录中查不到时使用的描述
pub const NOT_FOUND_DESCRIPTION: &str = "PRODUCT NOT FOUND";

/// 项集长度上限, 防止 Apriori 组合爆炸
pub const MAX_ITEMSET_SIZE: usize = 4;

/// 交叉销售推荐服务
///
/// 只在包含查询商品的发票上做挖掘, 事务集合比全量发票小得多。
#[derive(Debug, Clone)]
pub struct CrossSellRecommender {
    table: Arc<TransactionTable>,
    catalog: IndexMap<i64, CatalogEntry>,
}

impl CrossSellRecommender {
    pub fn new(table: Arc<TransactionTable>) -> Self {
        let catalog = dedup_first(table.rows());
        Self { table, catalog }
    }

    /// 包含该商品的每张发票上的去重商品编码集合 (按发票首次出现顺序)
    pub fn baskets_for(&self, product_code: i64) -> Vec<BTreeSet<i64>> {
        let invoices: HashSet<&str> = self
            .table
            .rows()
            .iter()
            .filter(|r| r.product_code == product_code)
            .map(|r| r.invoice_id.as_str())
            .collect();

        let mut baskets: IndexMap<&str, BTreeSet<i64>> = IndexMap::new();
        for row in self.table.rows() {
            if invoices.contains(row.invoice_id.as_str()) {
                baskets
                    .entry(row.invoice_id.as_str())
                    .or_default()
                    .insert(row.product_code);
            }
        }

        baskets.into_values().collect()
    }

    /// 生成涉及查询商品的关联规则
    ///
    /// `min_lift` 作用在 lift 上 (不是 confidence), 只保留强于随机共现的组合。
    pub fn generate_rules(
        &self,
        query_code: i64,
        min_support: f64,
        min_lift: f64,
        max_itemset_size: usize,
    ) -> AppResult<CrossSellOutcome> {
        if !(min_support > 0.0 && min_support <= 1.0) {
            return Err(AppError::InvalidParameter(format!(
                "min_support must be in (0, 1], got {}",
                min_support
            )));
        }
        if max_itemset_size == 0 || max_itemset_size > MAX_ITEMSET_SIZE {
            return Err(AppError::InvalidParameter(format!(
                "max_itemset_size must be in 1..={}, got {}",
                MAX_ITEMSET_SIZE, max_itemset_size
            )));
        }
        if min_lift.is_nan() {
            return Err(AppError::InvalidParameter("min_lift is NaN".to_string()));
        }

        let baskets = self.baskets_for(query_code);
        let encoded = OneHotBaskets::encode(&baskets);
        tracing::debug!(
            "Product {}: {} invoices, {} distinct products",
            query_code,
            encoded.len(),
            encoded.columns().len()
        );

        let itemsets = Apriori::new(min_support, max_itemset_size).frequent_itemsets(&encoded);
        if itemsets.is_empty() {
            tracing::info!("Product {}: no frequent itemsets", query_code);
            return Ok(CrossSellOutcome::NoFrequentItemsets);
        }

        let mut rules: Vec<AssociationRule> = association_rules(&itemsets, min_lift)
            .into_iter()
            .filter(|rule| rule.involves(query_code))
            .collect();
        if rules.is_empty() {
            tracing::info!(
                "Product {}: {} frequent itemsets but no rules involving it",
                query_code,
                itemsets.len()
            );
            return Ok(CrossSellOutcome::NoRulesForProduct);
        }

        rules.sort_by(|a, b| {
            b.lift
                .total_cmp(&a.lift)
                .then_with(|| b.confidence.total_cmp(&a.confidence))
                .then_with(|| b.support.total_cmp(&a.support))
                .then_with(|| a.antecedent.cmp(&b.antecedent))
                .then_with(|| a.consequent.cmp(&b.consequent))
        });
        tracing::info!("Product {}: {} association rules", query_code, rules.len());

        Ok(CrossSellOutcome::Rules(rules))
    }

    /// 规则转为展示行; 多元素的一侧取第一个编码作为代表
    pub fn format_rules(&self, rules: &[AssociationRule]) -> Vec<FormattedRule> {
        rules
            .iter()
            .map(|rule| {
                let antecedent_code = rule.antecedent.first().copied().unwrap_or_default();
                let consequent_code = rule.consequent.first().copied().unwrap_or_default();
                let antecedent = self.catalog.get(&antecedent_code);
                let consequent = self.catalog.get(&consequent_code);

                FormattedRule {
                    antecedent_code,
                    antecedent_description: describe(antecedent),
                    consequent_code,
                    consequent_description: describe(consequent),
                    consequent_unit_price: consequent
                        .map(|e| e.unit_price.round(2))
                        .unwrap_or_else(BigDecimal::zero),
                    consequent_margin_pct: consequent
                        .map(|e| super::substitute::round2(e.margin_pct * 100.0))
                        .unwrap_or(0.0),
                    consequent_stock: consequent.map(|e| e.stock_quantity).unwrap_or(0),
                    support: format_percentage(rule.support),
                    confidence: format_percentage(rule.confidence),
                    lift: rule.lift,
                }
            })
            .collect()
    }

    /// 商品描述, 查不到返回 None
    pub fn description_of(&self, product_code: i64) -> Option<&str> {
        self.catalog.get(&product_code).map(|e| e.description.as_str())
    }
}

fn describe(entry: Option<&CatalogEntry>) -> String {
    entry
        .map(|e| e.description.clone())
        .unwrap_or_else(|| NOT_FOUND_DESCRIPTION.to_string())
}

/// 0.1234 -> "12.34%"
pub fn format_percentage(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

/// "12.34%" -> 12.34
pub fn parse_percentage(text: &str) -> Option<f64> {
    text.trim().trim_end_matches('%').trim().parse().ok()
}
