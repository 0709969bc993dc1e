pub mod handlers;

pub use handlers::*;

use crate::service::{RecommendationRecorder, RecommendationService};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// 共享状态: 推荐服务 + 可选的日志记录器
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<RecommendationService>,
    pub recorder: Option<Arc<RecommendationRecorder>>,
}

/// 构建路由
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/recommend", post(recommend))
        .route("/api/recommend/substitutes", post(substitutes))
        .route("/api/recommend/cross-sell", post(cross_sell))
        .with_state(state)
}
