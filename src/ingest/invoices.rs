use crate::error::AppResult;
use bigdecimal::{BigDecimal, Zero};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashSet;
use std::io::Read;

#[derive(Debug, Deserialize)]
struct RawInvoiceLine {
    invoice_id: String,
    sale_date: String,
    product_code: i64,
    product_description: String,
    quantity_sold: i64,
    unit_price: BigDecimal,
    unit_cost: Option<BigDecimal>,
}

/// 清洗后的发票明细
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceLine {
    pub invoice_id: String,
    pub sale_date: NaiveDate,
    pub product_code: i64,
    pub product_description: String,
    pub quantity_sold: i64,
    pub unit_price: BigDecimal,
    pub unit_cost: Option<BigDecimal>,
}

/// 日期格式 dd/mm/YYYY, 兼容 ISO
fn parse_sale_date(text: &str) -> AppResult<NaiveDate> {
    match NaiveDate::parse_from_str(text, "%d/%m/%Y") {
        Ok(date) => Ok(date),
        Err(_) => Ok(NaiveDate::parse_from_str(text, "%Y-%m-%d")?),
    }
}

/// 读取发票 CSV
///
/// 只要一张发票中有一行数量 <= 0 或单价为 0, 整张发票丢弃。
pub fn read_invoices<R: Read>(reader: R) -> AppResult<Vec<InvoiceLine>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut lines = Vec::new();
    for result in csv_reader.deserialize::<RawInvoiceLine>() {
        let raw = result?;
        lines.push(InvoiceLine {
            sale_date: parse_sale_date(&raw.sale_date)?,
            invoice_id: raw.invoice_id,
            product_code: raw.product_code,
            product_description: raw.product_description,
            quantity_sold: raw.quantity_sold,
            unit_price: raw.unit_price.round(2),
            unit_cost: raw.unit_cost.map(|c| c.round(2)),
        });
    }

    let rejected: HashSet<String> = lines
        .iter()
        .filter(|l| l.quantity_sold <= 0 || l.unit_price.is_zero())
        .map(|l| l.invoice_id.clone())
        .collect();

    let total = lines.len();
    lines.retain(|l| !rejected.contains(&l.invoice_id));
    tracing::info!(
        "Invoices loaded: {} lines, {} invoices rejected, {} lines kept",
        total,
        rejected.len(),
        lines.len()
    );

    Ok(lines)
}
