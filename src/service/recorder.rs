use crate::db::queries;
use crate::error::AppResult;
use crate::models::{AssociationLogRecord, SubstituteLogRecord};
use crate::service::cross_sell::parse_percentage;
use crate::service::query::QueryReport;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

/// 把查询结果写入两张日志表
pub struct RecommendationRecorder {
    pool: PgPool,
    limit: usize,
}

impl RecommendationRecorder {
    pub fn new(pool: PgPool, limit: usize) -> Self {
        Self { pool, limit }
    }

    /// 写入一次查询的结果, 返回 (替代品行数, 关联商品行数)
    ///
    /// 编码既不是商品也不是品类时不写入。
    pub async fn record(&self, report: &QueryReport) -> AppResult<(usize, usize)> {
        if report.query_description.is_none() {
            tracing::info!(
                "Code {} is neither a product nor a category, nothing persisted",
                report.query_code
            );
            return Ok((0, 0));
        }

        let now = Utc::now();
        let substitutes = substitute_records(report, self.limit, now);
        let associations = association_records(report, self.limit, now);

        // 两张表在同一事务里提交, 失败时整体回滚
        let mut tx = self.pool.begin().await?;
        for chunk in substitutes.chunks(1000) {
            queries::insert_substitutes(&mut tx, chunk).await?;
        }
        for chunk in associations.chunks(1000) {
            queries::insert_associations(&mut tx, chunk).await?;
        }
        tx.commit().await?;

        tracing::info!(
            "Query {} persisted: {} substitutes, {} associations",
            report.query_code,
            substitutes.len(),
            associations.len()
        );
        Ok((substitutes.len(), associations.len()))
    }
}

/// 替代品日志行: 前面补上查询编码和描述
pub fn substitute_records(
    report: &QueryReport,
    limit: usize,
    inserted_at: DateTime<Utc>,
) -> Vec<SubstituteLogRecord> {
    let queried_description = report.query_description.clone().unwrap_or_default();

    report
        .substitutes
        .rows()
        .iter()
        .take(limit)
        .map(|row| SubstituteLogRecord {
            queried_code: report.query_code.to_string(),
            queried_description: queried_description.clone(),
            recommended_code: row.product_code.to_string(),
            recommended_description: row.description.clone(),
            unit_price: row.unit_price.clone(),
            margin_pct: row.margin_pct,
            stock_quantity: row.stock_quantity,
            category: row.category.clone(),
            inserted_at,
        })
        .collect()
}

/// 关联商品日志行: 只保留前件等于查询编码的规则
pub fn association_records(
    report: &QueryReport,
    limit: usize,
    inserted_at: DateTime<Utc>,
) -> Vec<AssociationLogRecord> {
    report
        .associations
        .iter()
        .filter(|rule| rule.antecedent_code == report.query_code)
        .take(limit)
        .map(|rule| AssociationLogRecord {
            queried_code: rule.antecedent_code.to_string(),
            queried_description: rule.antecedent_description.clone(),
            associated_code: rule.consequent_code.to_string(),
            associated_description: rule.consequent_description.clone(),
            support: parse_percentage(&rule.support).unwrap_or(0.0),
            confidence: parse_percentage(&rule.confidence).unwrap_or(0.0),
            inserted_at,
        })
        .collect()
}
