use crate::models::{CatalogEntry, TransactionRow};
use indexmap::IndexMap;

/// 按商品编码去重, 首次出现的行生效; 保留首次出现顺序
pub fn dedup_first(rows: &[TransactionRow]) -> IndexMap<i64, CatalogEntry> {
    let mut catalog: IndexMap<i64, CatalogEntry> = IndexMap::new();
    for row in rows {
        catalog
            .entry(row.product_code)
            .or_insert_with(|| CatalogEntry {
                product_code: row.product_code,
                description: row.product_description.clone(),
                category_code: row.category_code,
                category_name: row.category_name.clone(),
                brand_name: row.brand_name.clone(),
                unit_price: row.unit_price.clone(),
                margin_pct: row.margin_pct,
                stock_quantity: row.stock_quantity,
            });
    }
    catalog
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::transaction::fixtures::row;

    #[test]
    fn first_occurrence_wins_and_order_is_kept() {
        let mut later = row("B", 100, 1, "50.00", 0.10, 0);
        later.stock_quantity = 99;

        let rows = vec![
            row("A", 200, 1, "10.00", 0.20, 3),
            row("A", 100, 1, "50.00", 0.10, 0),
            later,
        ];

        let catalog = dedup_first(&rows);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.keys().copied().collect::<Vec<_>>(), vec![200, 100]);
        assert_eq!(catalog[&100].stock_quantity, 0);
    }
}
