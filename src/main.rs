use retail_recommender::{
    api::{self, AppState},
    create_pool, db, ingest, report,
    service::recorder,
    AppConfig, RecommendationRecorder, RecommendationService,
};
use std::path::Path;
use std::sync::Arc;
use tower::ServiceBuilder;
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;

/// 用法:
///   retail-recommender                       启动 HTTP 服务
///   retail-recommender <code> [export.csv]   查询一次, 打印报告后退出
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志 - 使用本地时间格式
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .init();

    // 加载配置
    let config = AppConfig::from_env()?;
    info!("Starting with config: {:?}", config);

    // 构建交易表
    let table = ingest::load_transaction_table(
        Path::new(&config.data.stock_path),
        Path::new(&config.data.invoices_path),
    )?;
    info!("Model table has {} valid rows", table.len());

    let service = Arc::new(RecommendationService::new(
        Arc::new(table),
        config.recommender.clone(),
    ));

    // 可选: 数据库日志
    let recorder = if config.database.enabled {
        let pool = create_pool(&config.database.url).await?;
        db::ensure_schema(&pool).await?;
        info!("Database pool created");
        Some(Arc::new(RecommendationRecorder::new(
            pool,
            config.recommender.persist_limit,
        )))
    } else {
        info!("Database disabled, results will not be persisted");
        None
    };

    let args: Vec<String> = std::env::args().collect();
    if let Some(code) = args.get(1) {
        let code: i64 = code.parse()?;
        let query_report = service.query(code)?;
        println!("{}", report::render(&query_report));
        if let Some(output) = args.get(2) {
            let records = recorder::substitute_records(
                &query_report,
                config.recommender.persist_limit,
                chrono::Utc::now(),
            );
            db::export_to_csv(&records, Path::new(output))?;
            info!("Exported {} substitutes to {}", records.len(), output);
        }
        if let Some(recorder) = &recorder {
            recorder.record(&query_report).await?;
        }
        return Ok(());
    }

    let app = api::router(AppState { service, recorder }).layer(ServiceBuilder::new());

    // 启动服务器
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  POST /api/recommend             - substitutes + cross-sell");
    info!("  POST /api/recommend/substitutes - substitutes only");
    info!("  POST /api/recommend/cross-sell  - association rules only");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
