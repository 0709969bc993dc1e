use crate::api::AppState;
use crate::error::AppError;
use crate::models::{CrossSellOutcome, FormattedRule, SubstituteOutcome};
use crate::service::QueryReport;
use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// 请求体: 完整查询
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub code: i64,
}

/// 请求体: 替代品
#[derive(Debug, Deserialize)]
pub struct SubstituteRequest {
    pub code: i64,
    pub n: Option<usize>,
}

/// 请求体: 交叉销售, 未给出的参数取配置值
#[derive(Debug, Deserialize)]
pub struct CrossSellRequest {
    pub code: i64,
    pub min_support: Option<f64>,
    pub min_lift: Option<f64>,
    pub max_itemset_size: Option<usize>,
}

/// 通用错误响应体
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

/// 完整查询响应体
#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub success: bool,
    pub message: String,
    pub report: QueryReport,
    /// 已写入的 (替代品, 关联商品) 行数; 未配置数据库时为 None
    pub persisted: Option<(usize, usize)>,
}

#[derive(Debug, Serialize)]
pub struct SubstituteResponse {
    pub success: bool,
    pub message: String,
    pub outcome: SubstituteOutcome,
}

#[derive(Debug, Serialize)]
pub struct CrossSellResponse {
    pub success: bool,
    pub message: String,
    pub outcome: CrossSellOutcome,
    pub rules: Vec<FormattedRule>,
}

fn error_response(e: AppError) -> Response {
    let status = match e {
        AppError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let response = ErrorResponse {
        success: false,
        message: format!("Error: {}", e),
    };
    (status, Json(response)).into_response()
}

/// 健康检查
pub async fn health_check() -> &'static str {
    "OK"
}

/// 完整查询 (替代品 + 关联商品), 配置了数据库时写日志表
pub async fn recommend(State(state): State<AppState>, Json(req): Json<QueryRequest>) -> Response {
    let report = match state.service.query(req.code) {
        Ok(report) => report,
        Err(e) => return error_response(e),
    };

    let persisted = match &state.recorder {
        Some(recorder) => match recorder.record(&report).await {
            Ok(counts) => Some(counts),
            Err(e) => {
                tracing::error!("Persisting query {} failed: {}", req.code, e);
                return error_response(e);
            }
        },
        None => None,
    };

    let response = QueryResponse {
        success: true,
        message: report.substitutes.notice(),
        report,
        persisted,
    };
    (StatusCode::OK, Json(response)).into_response()
}

/// 替代品推荐
pub async fn substitutes(
    State(state): State<AppState>,
    Json(req): Json<SubstituteRequest>,
) -> Response {
    let n = req
        .n
        .unwrap_or(state.service.settings().substitute_count);
    let outcome = state.service.substitutes().recommend(req.code, n);

    let response = SubstituteResponse {
        success: true,
        message: outcome.notice(),
        outcome,
    };
    (StatusCode::OK, Json(response)).into_response()
}

/// 交叉销售规则
pub async fn cross_sell(
    State(state): State<AppState>,
    Json(req): Json<CrossSellRequest>,
) -> Response {
    let settings = state.service.settings();
    let engine = state.service.cross_sell();

    let outcome = match engine.generate_rules(
        req.code,
        req.min_support.unwrap_or(settings.min_support),
        req.min_lift.unwrap_or(settings.min_lift),
        req.max_itemset_size.unwrap_or(settings.max_itemset_size),
    ) {
        Ok(outcome) => outcome,
        Err(e) => return error_response(e),
    };
    let rules = engine.format_rules(outcome.rules());

    let message = match &outcome {
        CrossSellOutcome::NoFrequentItemsets => "No frequent itemsets".to_string(),
        CrossSellOutcome::NoRulesForProduct => {
            format!("No association rules involve product {}", req.code)
        }
        CrossSellOutcome::Rules(found) => format!("{} association rules", found.len()),
    };

    let response = CrossSellResponse {
        success: true,
        message,
        outcome,
        rules,
    };
    (StatusCode::OK, Json(response)).into_response()
}
