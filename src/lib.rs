pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod models;
pub mod report;
pub mod service;

pub use crate::config::AppConfig;
pub use db::create_pool;
pub use error::{AppError, AppResult};
pub use service::{
    CrossSellRecommender, RecommendationRecorder, RecommendationService, SubstituteRecommender,
};
