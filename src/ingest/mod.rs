pub mod invoices;
pub mod prepare;
pub mod stock;

pub use invoices::{read_invoices, InvoiceLine};
pub use prepare::prepare_model_table;
pub use stock::{read_stock, StockRecord};

use crate::error::AppResult;
use crate::models::TransactionTable;
use std::fs::File;
use std::path::Path;

/// 从库存与发票 CSV 文件构建交易表
pub fn load_transaction_table(stock_path: &Path, invoices_path: &Path) -> AppResult<TransactionTable> {
    tracing::info!("Loading stock from {}", stock_path.display());
    let stock = read_stock(File::open(stock_path)?)?;

    tracing::info!("Loading invoices from {}", invoices_path.display());
    let invoices = read_invoices(File::open(invoices_path)?)?;

    prepare_model_table(&stock, &invoices)
}
