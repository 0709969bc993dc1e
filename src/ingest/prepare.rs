use crate::error::AppResult;
use crate::ingest::invoices::InvoiceLine;
use crate::ingest::stock::StockRecord;
use crate::models::{TransactionRow, TransactionTable};
use crate::service::substitute::round2;
use bigdecimal::{BigDecimal, ToPrimitive, Zero};
use std::collections::{HashMap, HashSet};

/// 合并库存与发票, 生成模型用交易表
///
/// 1. 按商品编码内连接 (每个编码取第一条库存记录)
/// 2. 丢弃成本缺失/为 0、单价为 0、负值、成本高于单价的行
/// 3. 计算行金额、发票金额、毛利、毛利率
/// 4. 丢弃行金额或发票金额 <= 0 的行
/// 5. 描述/品类/品牌不唯一的商品编码整体剔除
pub fn prepare_model_table(
    stock: &[StockRecord],
    invoices: &[InvoiceLine],
) -> AppResult<TransactionTable> {
    let mut stock_by_code: HashMap<i64, &StockRecord> = HashMap::new();
    for record in stock {
        stock_by_code.entry(record.product_code).or_insert(record);
    }

    let ambiguous = ambiguous_products(stock, invoices);
    if !ambiguous.is_empty() {
        tracing::warn!(
            "{} product codes rejected: ambiguous description/category/brand",
            ambiguous.len()
        );
    }

    let zero = BigDecimal::zero();
    let mut unmatched = 0usize;
    let mut invalid = 0usize;
    let mut rows: Vec<TransactionRow> = Vec::with_capacity(invoices.len());

    for line in invoices {
        if ambiguous.contains(&line.product_code) {
            continue;
        }
        let Some(stock) = stock_by_code.get(&line.product_code) else {
            unmatched += 1;
            continue;
        };
        let unit_cost = match &line.unit_cost {
            Some(cost) if *cost > zero && *cost <= line.unit_price => cost.clone(),
            _ => {
                invalid += 1;
                continue;
            }
        };
        if line.unit_price <= zero || line.quantity_sold < 0 {
            invalid += 1;
            continue;
        }

        let gross_margin = (&line.unit_price - &unit_cost).round(2);
        let margin_pct = (&gross_margin / &line.unit_price)
            .to_f64()
            .map(round2)
            .unwrap_or(0.0);

        rows.push(TransactionRow {
            invoice_id: line.invoice_id.clone(),
            sale_date: line.sale_date,
            product_code: line.product_code,
            product_description: line.product_description.clone(),
            category_code: stock.category_code,
            category_name: stock.category_name.clone(),
            brand_code: stock.brand_code,
            brand_name: stock.brand_name.clone(),
            quantity_sold: line.quantity_sold,
            line_total: BigDecimal::from(line.quantity_sold) * &line.unit_price,
            invoice_total: BigDecimal::zero(),
            unit_price: line.unit_price.clone(),
            unit_cost,
            stock_quantity: stock.stock_quantity,
            gross_margin,
            margin_pct,
        });
    }

    let mut invoice_totals: HashMap<String, BigDecimal> = HashMap::new();
    for row in &rows {
        *invoice_totals
            .entry(row.invoice_id.clone())
            .or_insert_with(BigDecimal::zero) += &row.line_total;
    }
    for row in rows.iter_mut() {
        if let Some(total) = invoice_totals.get(&row.invoice_id) {
            row.invoice_total = total.clone();
        }
    }

    let before = rows.len();
    rows.retain(|r| r.line_total > zero && r.invoice_total > zero);

    tracing::info!(
        "Model table prepared: {} rows ({} without stock record, {} invalid prices/costs, {} zero totals)",
        rows.len(),
        unmatched,
        invalid,
        before - rows.len()
    );

    TransactionTable::new(rows)
}

/// 同一编码在库存里对应多个品类/品牌, 或在发票里对应多个描述
fn ambiguous_products(stock: &[StockRecord], invoices: &[InvoiceLine]) -> HashSet<i64> {
    let mut ambiguous = HashSet::new();

    let mut identity: HashMap<i64, (i64, i64)> = HashMap::new();
    for record in stock {
        let seen = identity
            .entry(record.product_code)
            .or_insert((record.category_code, record.brand_code));
        if *seen != (record.category_code, record.brand_code) {
            ambiguous.insert(record.product_code);
        }
    }

    let mut descriptions: HashMap<i64, &str> = HashMap::new();
    for line in invoices {
        let seen = descriptions
            .entry(line.product_code)
            .or_insert(line.product_description.as_str());
        if *seen != line.product_description {
            ambiguous.insert(line.product_code);
        }
    }

    ambiguous
}
