use crate::error::AppResult;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub data: DataConfig,
    pub recommender: RecommenderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    /// 关闭时不建连接池, 推荐结果只返回不落库
    pub enabled: bool,
}

/// 输入文件 (库存 + 销售发票)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub stock_path: String,
    pub invoices_path: String,
}

/// 推荐参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommenderConfig {
    pub substitute_count: usize,
    pub min_support: f64,
    /// 作用在 lift 上的阈值
    pub min_lift: f64,
    pub max_itemset_size: usize,
    /// 每张日志表每次查询最多写入的行数
    pub persist_limit: usize,
    pub sample_seed: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: "postgres://localhost/bd_recomenda".to_string(),
                enabled: false,
            },
            data: DataConfig {
                stock_path: "bases/stock.csv".to_string(),
                invoices_path: "bases/invoices.csv".to_string(),
            },
            recommender: RecommenderConfig::default(),
        }
    }
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            substitute_count: 6,
            min_support: 0.005,
            min_lift: 1.0,
            max_itemset_size: 2,
            persist_limit: 6,
            sample_seed: 42,
        }
    }
}

impl AppConfig {
    /// 从环境变量加载配置
    ///
    /// 优先级: `DATABASE_URL` > `RECOMMEND_*` 环境变量 > `recommender.toml` (可选) > 默认值。
    /// 嵌套字段用 `__` 分隔, 例如 `RECOMMEND_SERVER__PORT=9000`。
    pub fn from_env() -> AppResult<Self> {
        Self::build(config::File::with_name("recommender").required(false))
    }

    /// 从指定配置文件加载 (文件必须存在), 环境变量仍然生效
    pub fn load(path: &Path) -> AppResult<Self> {
        Self::build(config::File::from(path).required(true))
    }

    fn build<S>(file: S) -> AppResult<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let defaults = config::Config::try_from(&AppConfig::default())?;

        let settings = config::Config::builder()
            .add_source(defaults)
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("RECOMMEND")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
