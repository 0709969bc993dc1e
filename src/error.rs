/// 库内统一结果类型
pub type AppResult<T> = Result<T, AppError>;

/// 错误类型
///
/// "无结果" 不属于错误: 解析失败、候选为空、无频繁项集都通过返回值表达。
/// 这里只收录上游契约被破坏 (表结构/参数非法) 以及 I/O 层面的失败。
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid transaction table: {0}")]
    InvalidTable(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid date: {0}")]
    DateParse(#[from] chrono::ParseError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}
