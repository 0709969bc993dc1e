use crate::config::RecommenderConfig;
use crate::error::AppResult;
use crate::models::{CrossSellOutcome, FormattedRule, Resolution, SubstituteOutcome, TransactionTable};
use crate::service::{CrossSellRecommender, SubstituteRecommender};
use serde::Serialize;
use std::sync::Arc;

/// 一次查询的完整结果 (替代品 + 关联商品)
#[derive(Debug, Clone, Serialize)]
pub struct QueryReport {
    pub query_code: i64,
    /// 商品描述或品类名; 编码无法解析时为 None
    pub query_description: Option<String>,
    pub substitutes: SubstituteOutcome,
    pub cross_sell: CrossSellOutcome,
    pub associations: Vec<FormattedRule>,
}

/// 推荐服务: 两个引擎共享同一张只读交易表
pub struct RecommendationService {
    table: Arc<TransactionTable>,
    substitutes: SubstituteRecommender,
    cross_sell: CrossSellRecommender,
    settings: RecommenderConfig,
}

impl RecommendationService {
    pub fn new(table: Arc<TransactionTable>, settings: RecommenderConfig) -> Self {
        let substitutes = SubstituteRecommender::new(&table).with_seed(settings.sample_seed);
        let cross_sell = CrossSellRecommender::new(Arc::clone(&table));
        tracing::info!(
            "Recommendation service ready: {} transaction rows, {} catalog products",
            table.len(),
            substitutes.catalog_len()
        );
        Self {
            table,
            substitutes,
            cross_sell,
            settings,
        }
    }

    pub fn settings(&self) -> &RecommenderConfig {
        &self.settings
    }

    pub fn table(&self) -> &TransactionTable {
        &self.table
    }

    pub fn substitutes(&self) -> &SubstituteRecommender {
        &self.substitutes
    }

    pub fn cross_sell(&self) -> &CrossSellRecommender {
        &self.cross_sell
    }

    /// 按配置参数跑两个引擎
    pub fn query(&self, query_code: i64) -> AppResult<QueryReport> {
        let substitutes = self
            .substitutes
            .recommend(query_code, self.settings.substitute_count);
        tracing::info!("Query {}: {}", query_code, substitutes.notice());

        let cross_sell = self.cross_sell.generate_rules(
            query_code,
            self.settings.min_support,
            self.settings.min_lift,
            self.settings.max_itemset_size,
        )?;
        let associations = self.cross_sell.format_rules(cross_sell.rules());

        Ok(QueryReport {
            query_code,
            query_description: self.describe(query_code),
            substitutes,
            cross_sell,
            associations,
        })
    }

    fn describe(&self, query_code: i64) -> Option<String> {
        match self.substitutes.resolve(query_code) {
            Resolution::Found(entry) => Some(entry.description),
            Resolution::CategoryOnly(code) => self
                .table
                .rows()
                .iter()
                .find(|r| r.category_code == code)
                .map(|r| r.category_name.clone()),
            Resolution::Unresolved => None,
        }
    }
}
