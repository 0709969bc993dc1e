use crate::error::AppResult;
use crate::models::{AssociationLogRecord, SubstituteLogRecord};
use sqlx::{PgConnection, PgPool};
use std::path::Path;

/// 建表 (不存在时)
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS product_substitutes (
            id BIGSERIAL PRIMARY KEY,
            queried_code VARCHAR,
            queried_description VARCHAR,
            recommended_code VARCHAR,
            recommended_description VARCHAR,
            unit_price NUMERIC,
            margin_pct DOUBLE PRECISION,
            stock_quantity BIGINT,
            category VARCHAR,
            inserted_at TIMESTAMPTZ
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS product_associations (
            id BIGSERIAL PRIMARY KEY,
            queried_code VARCHAR,
            queried_description VARCHAR,
            associated_code VARCHAR,
            associated_description VARCHAR,
            support DOUBLE PRECISION,
            confidence DOUBLE PRECISION,
            inserted_at TIMESTAMPTZ
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// 批量插入替代品日志 (在调用方的事务里执行)
pub async fn insert_substitutes(
    conn: &mut PgConnection,
    records: &[SubstituteLogRecord],
) -> Result<(), sqlx::Error> {
    if records.is_empty() {
        return Ok(());
    }

    tracing::debug!("开始构建替代品批量插入语句, {} 条记录", records.len());

    let mut query_builder = sqlx::QueryBuilder::new(
        "INSERT INTO product_substitutes (
            queried_code, queried_description,
            recommended_code, recommended_description,
            unit_price, margin_pct, stock_quantity, category,
            inserted_at
        ) ",
    );

    query_builder.push_values(records, |mut b, record| {
        b.push_bind(&record.queried_code)
            .push_bind(&record.queried_description)
            .push_bind(&record.recommended_code)
            .push_bind(&record.recommended_description)
            .push_bind(record.unit_price.clone())
            .push_bind(record.margin_pct)
            .push_bind(record.stock_quantity)
            .push_bind(&record.category)
            .push_bind(record.inserted_at);
    });

    execute_with_timeout(conn, query_builder, "product_substitutes").await
}

/// 批量插入关联商品日志 (在调用方的事务里执行)
pub async fn insert_associations(
    conn: &mut PgConnection,
    records: &[AssociationLogRecord],
) -> Result<(), sqlx::Error> {
    if records.is_empty() {
        return Ok(());
    }

    tracing::debug!("开始构建关联商品批量插入语句, {} 条记录", records.len());

    let mut query_builder = sqlx::QueryBuilder::new(
        "INSERT INTO product_associations (
            queried_code, queried_description,
            associated_code, associated_description,
            support, confidence,
            inserted_at
        ) ",
    );

    query_builder.push_values(records, |mut b, record| {
        b.push_bind(&record.queried_code)
            .push_bind(&record.queried_description)
            .push_bind(&record.associated_code)
            .push_bind(&record.associated_description)
            .push_bind(record.support)
            .push_bind(record.confidence)
            .push_bind(record.inserted_at);
    });

    execute_with_timeout(conn, query_builder, "product_associations").await
}

async fn execute_with_timeout(
    conn: &mut PgConnection,
    mut query_builder: sqlx::QueryBuilder<'_, sqlx::Postgres>,
    table: &str,
) -> Result<(), sqlx::Error> {
    let execute_start = std::time::Instant::now();

    // 添加超时控制: 30秒
    let execute_result = tokio::time::timeout(
        std::time::Duration::from_secs(30),
        query_builder.build().execute(&mut *conn),
    )
    .await;

    match execute_result {
        Ok(Ok(result)) => {
            tracing::info!(
                "✓ INSERT {} 成功, 影响 {} 行, 耗时: {:?}",
                table,
                result.rows_affected(),
                execute_start.elapsed()
            );
            Ok(())
        }
        Ok(Err(e)) => {
            tracing::error!(
                "✗ INSERT {} 失败, 耗时: {:?}, 错误: {:?}",
                table,
                execute_start.elapsed(),
                e
            );
            Err(e)
        }
        Err(_) => {
            tracing::error!("✗ INSERT {} 超时 (>30秒)!", table);
            Err(sqlx::Error::PoolTimedOut)
        }
    }
}

/// 导出替代品日志到 CSV 文件 (带表头)
pub fn export_to_csv(
    records: &[SubstituteLogRecord],
    output_path: &Path,
) -> AppResult<()> {
    use csv::Writer;
    use std::fs::File;

    let file = File::create(output_path)?;
    let mut writer = Writer::from_writer(file);

    writer.write_record([
        "queried_code",
        "queried_description",
        "recommended_code",
        "recommended_description",
        "unit_price",
        "margin_pct",
        "stock_quantity",
        "category",
        "inserted_at",
    ])?;

    for record in records {
        writer.write_record(&[
            record.queried_code.clone(),
            record.queried_description.clone(),
            record.recommended_code.clone(),
            record.recommended_description.clone(),
            record.unit_price.to_string(),
            format!("{:.2}", record.margin_pct),
            record.stock_quantity.to_string(),
            record.category.clone(),
            record.inserted_at.to_rfc3339(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
