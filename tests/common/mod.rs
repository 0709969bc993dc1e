#![allow(dead_code)]

use retail_recommender::ingest::{prepare_model_table, read_invoices, read_stock};
use retail_recommender::models::TransactionTable;

pub const STOCK_CSV: &str = "\
product_code,product_description,category_code,category_name,brand_code,brand_name,stock_quantity
100,Papel A4,1,Papelaria,7,Chamex,0
101,Papel A3,1,Papelaria,7,Chamex,5
102,Papel Carta,1,Papelaria,9,Report,3
200,Caneta Azul,2,Escrita,8,Bic,4
";

pub const INVOICES_CSV: &str = "\
invoice_id,sale_date,product_code,product_description,quantity_sold,unit_price,unit_cost
NF1,14/03/2025,100,Papel A4,1,50.00,45.00
NF1,14/03/2025,101,Papel A3,1,55.00,48.40
NF2,15/03/2025,100,Papel A4,2,50.00,45.00
NF2,15/03/2025,101,Papel A3,1,55.00,48.40
NF3,16/03/2025,200,Caneta Azul,3,4.00,3.00
NF4,17/03/2025,102,Papel Carta,1,80.00,60.00
NF5,17/03/2025,200,Caneta Azul,0,4.00,3.00
";

pub fn sample_table() -> TransactionTable {
    let stock = read_stock(STOCK_CSV.as_bytes()).expect("stock parses");
    let invoices = read_invoices(INVOICES_CSV.as_bytes()).expect("invoices parse");
    prepare_model_table(&stock, &invoices).expect("table is valid")
}
