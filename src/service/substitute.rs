use crate::models::{
    CatalogEntry, FallbackReason, Resolution, SubstituteOutcome, SubstituteRow, TransactionTable,
};
use crate::service::catalog::dedup_first;
use bigdecimal::ToPrimitive;
use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

/// 默认推荐数量
pub const DEFAULT_SUBSTITUTES: usize = 6;

const PRICE_WEIGHT: f64 = 0.7;
const MARGIN_WEIGHT: f64 = 0.3;

/// 替代品推荐服务
///
/// 解析顺序: 商品编码 → 品类编码 → 全局。任何一级候选为空都降级到下一级,
/// 最后一级在全部有库存商品中随机抽样, 只要全局有库存就不会返回空。
#[derive(Debug, Clone)]
pub struct SubstituteRecommender {
    catalog: IndexMap<i64, CatalogEntry>,
    categories: HashSet<i64>,
    seed: u64,
}

impl SubstituteRecommender {
    pub fn new(table: &TransactionTable) -> Self {
        let catalog = dedup_first(table.rows());
        let categories = catalog.values().map(|e| e.category_code).collect();
        Self {
            catalog,
            categories,
            seed: 0,
        }
    }

    /// 抽样用的随机种子; 同一种子同一查询结果相同
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn catalog_len(&self) -> usize {
        self.catalog.len()
    }

    pub fn resolve(&self, query_code: i64) -> Resolution {
        if let Some(entry) = self.catalog.get(&query_code) {
            Resolution::Found(entry.clone())
        } else if self.categories.contains(&query_code) {
            Resolution::CategoryOnly(query_code)
        } else {
            Resolution::Unresolved
        }
    }

    /// 推荐替代品, 抽样使用配置的种子
    pub fn recommend(&self, query_code: i64, n: usize) -> SubstituteOutcome {
        let mut rng = StdRng::seed_from_u64(self.seed);
        self.recommend_with_rng(query_code, n, &mut rng)
    }

    pub fn recommend_with_rng<R: Rng + ?Sized>(
        &self,
        query_code: i64,
        n: usize,
        rng: &mut R,
    ) -> SubstituteOutcome {
        match self.resolve(query_code) {
            Resolution::Found(reference) => {
                let ranked = self.rank_substitutes(&reference);
                if ranked.is_empty() {
                    tracing::info!(
                        "Product {} has no in-stock substitutes in category {}, falling back to alternatives",
                        query_code, reference.category_code
                    );
                    return self.alternatives(
                        FallbackReason::NoSubstitutesInCategory,
                        Some(reference.product_code),
                        n,
                        rng,
                    );
                }

                let rows = ranked
                    .into_iter()
                    .take(n)
                    .map(|(entry, distance)| to_row(entry, true, Some(distance)))
                    .collect();
                SubstituteOutcome::Substitutes { reference, rows }
            }
            Resolution::CategoryOnly(category_code) => {
                let pool: Vec<&CatalogEntry> = self
                    .in_stock()
                    .filter(|e| e.category_code == category_code)
                    .collect();
                if pool.is_empty() {
                    tracing::info!(
                        "Category {} has no products in stock, falling back to alternatives",
                        category_code
                    );
                    return self.alternatives(FallbackReason::NoStockInCategory, None, n, rng);
                }

                let rows = sample(&pool, n, rng)
                    .into_iter()
                    .map(|entry| to_row(entry, true, None))
                    .collect();
                SubstituteOutcome::CategorySample {
                    category_code,
                    rows,
                }
            }
            Resolution::Unresolved => {
                tracing::warn!(
                    "Code {} not found as product or category, sampling in-stock alternatives",
                    query_code
                );
                self.alternatives(FallbackReason::UnknownCode, None, n, rng)
            }
        }
    }

    /// 同品类、非自身、有库存的候选, 按加权距离升序 (距离相同按编码)
    fn rank_substitutes<'a>(&'a self, reference: &CatalogEntry) -> Vec<(&'a CatalogEntry, f64)> {
        let ref_price = reference.unit_price.to_f64().unwrap_or(0.0);
        let scale = if ref_price > 0.0 { ref_price } else { 1.0 };

        let mut ranked: Vec<(&CatalogEntry, f64)> = self
            .in_stock()
            .filter(|e| {
                e.category_code == reference.category_code
                    && e.product_code != reference.product_code
            })
            .map(|e| {
                let price = e.unit_price.to_f64().unwrap_or(0.0);
                let price_distance = (price - ref_price).abs() / scale;
                let margin_distance = (e.margin_pct - reference.margin_pct).abs();
                (e, PRICE_WEIGHT * price_distance + MARGIN_WEIGHT * margin_distance)
            })
            .collect();

        ranked.sort_by(|a, b| {
            a.1.total_cmp(&b.1)
                .then_with(|| a.0.product_code.cmp(&b.0.product_code))
        });
        ranked
    }

    /// 全局有库存商品抽样; `exclude` 为查询商品自身
    fn alternatives<R: Rng + ?Sized>(
        &self,
        reason: FallbackReason,
        exclude: Option<i64>,
        n: usize,
        rng: &mut R,
    ) -> SubstituteOutcome {
        let pool: Vec<&CatalogEntry> = self
            .in_stock()
            .filter(|e| Some(e.product_code) != exclude)
            .collect();
        let rows = sample(&pool, n, rng)
            .into_iter()
            .map(|entry| to_row(entry, false, None))
            .collect();
        SubstituteOutcome::Alternatives { reason, rows }
    }

    fn in_stock(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.catalog.values().filter(|e| e.stock_quantity > 0)
    }
}

/// 不放回均匀抽样, 数量 min(n, pool.len())
fn sample<'a, R: Rng + ?Sized>(
    pool: &[&'a CatalogEntry],
    n: usize,
    rng: &mut R,
) -> Vec<&'a CatalogEntry> {
    pool.choose_multiple(rng, n).copied().collect()
}

fn to_row(entry: &CatalogEntry, with_brand: bool, distance: Option<f64>) -> SubstituteRow {
    SubstituteRow {
        product_code: entry.product_code,
        description: entry.description.clone(),
        unit_price: entry.unit_price.round(2),
        margin_pct: round2(entry.margin_pct * 100.0),
        brand: with_brand.then(|| entry.brand_name.clone()),
        stock_quantity: entry.stock_quantity,
        category: entry.category_name.clone(),
        distance,
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::transaction::fixtures::row;
    use bigdecimal::BigDecimal;
    use std::str::FromStr;

    fn recommender(rows: Vec<crate::models::TransactionRow>) -> SubstituteRecommender {
        let table = TransactionTable::new(rows).expect("valid table");
        SubstituteRecommender::new(&table).with_seed(7)
    }

    fn codes(outcome: &SubstituteOutcome) -> Vec<i64> {
        outcome.rows().iter().map(|r| r.product_code).collect()
    }

    fn mixed_catalog() -> SubstituteRecommender {
        recommender(vec![
            row("A", 100, 1, "50.00", 0.10, 0),
            row("A", 101, 1, "55.00", 0.12, 5),
            row("B", 102, 1, "50.00", 0.30, 2),
            row("B", 103, 1, "80.00", 0.10, 9),
            row("C", 104, 1, "50.00", 0.10, 0),
            row("C", 105, 2, "50.00", 0.10, 4),
            row("D", 106, 2, "12.00", 0.40, 1),
            row("D", 107, 3, "12.00", 0.40, 0),
        ])
    }

    #[test]
    fn out_of_stock_product_gets_single_in_category_substitute() {
        let rec = recommender(vec![
            row("A", 100, 1, "50.00", 0.10, 0),
            row("B", 101, 1, "55.00", 0.12, 5),
        ]);

        let outcome = rec.recommend(100, 5);
        assert!(matches!(outcome, SubstituteOutcome::Substitutes { .. }));
        assert_eq!(codes(&outcome), vec![101]);
    }

    #[test]
    fn substitutes_are_ranked_by_weighted_distance() {
        let outcome = mixed_catalog().recommend(100, 6);

        // 102: 0.3*0.20 = 0.06, 101: 0.7*0.10 + 0.3*0.02 = 0.076, 103: 0.7*0.60 = 0.42
        assert_eq!(codes(&outcome), vec![102, 101, 103]);

        let distances: Vec<f64> = outcome
            .rows()
            .iter()
            .map(|r| r.distance.expect("product mode carries distance"))
            .collect();
        assert!(distances.windows(2).all(|w| w[0] <= w[1]));
        assert!((distances[0] - 0.06).abs() < 1e-9);
        assert!((distances[1] - 0.076).abs() < 1e-9);
    }

    #[test]
    fn substitutes_respect_limit_and_exclusions() {
        let outcome = mixed_catalog().recommend(100, 2);

        assert_eq!(codes(&outcome), vec![102, 101]);
        for r in outcome.rows() {
            assert_ne!(r.product_code, 100);
            assert!(r.stock_quantity > 0);
            assert_eq!(r.category, "Category 1");
        }
    }

    #[test]
    fn distance_ties_break_by_product_code() {
        let rec = recommender(vec![
            row("A", 100, 1, "50.00", 0.10, 0),
            row("A", 301, 1, "60.00", 0.10, 1),
            row("A", 300, 1, "40.00", 0.10, 1),
        ]);

        assert_eq!(codes(&rec.recommend(100, 6)), vec![300, 301]);
    }

    #[test]
    fn unknown_code_samples_in_stock_alternatives() {
        let rec = mixed_catalog();
        let in_stock = 5;

        for n in [0, 2, 5, 10] {
            let outcome = rec.recommend(9999, n);
            match &outcome {
                SubstituteOutcome::Alternatives { reason, rows } => {
                    assert_eq!(*reason, FallbackReason::UnknownCode);
                    assert_eq!(rows.len(), n.min(in_stock));
                    assert!(rows.iter().all(|r| r.stock_quantity > 0 && r.brand.is_none()));
                }
                other => panic!("expected alternatives, got {:?}", other),
            }
            assert!(outcome.notice().starts_with("code not found as product or category"));
        }
    }

    #[test]
    fn product_alone_in_category_is_not_its_own_alternative() {
        let rec = recommender(vec![
            row("A", 100, 1, "50.00", 0.10, 4),
            row("B", 200, 2, "20.00", 0.20, 0),
        ]);

        let outcome = rec.recommend(100, 6);
        match &outcome {
            SubstituteOutcome::Alternatives { reason, rows } => {
                assert_eq!(*reason, FallbackReason::NoSubstitutesInCategory);
                assert!(rows.is_empty());
            }
            other => panic!("expected alternatives, got {:?}", other),
        }

        let rec = recommender(vec![
            row("A", 100, 1, "50.00", 0.10, 4),
            row("B", 200, 2, "20.00", 0.20, 3),
        ]);
        assert_eq!(codes(&rec.recommend(100, 6)), vec![200]);
    }

    #[test]
    fn alternatives_do_not_repeat_products() {
        let outcome = mixed_catalog().recommend(9999, 10);
        let mut seen = codes(&outcome);
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), outcome.rows().len());
    }

    #[test]
    fn category_code_samples_within_category() {
        let outcome = mixed_catalog().recommend(2, 6);

        match &outcome {
            SubstituteOutcome::CategorySample { category_code, rows } => {
                assert_eq!(*category_code, 2);
                let mut got: Vec<i64> = rows.iter().map(|r| r.product_code).collect();
                got.sort_unstable();
                assert_eq!(got, vec![105, 106]);
                assert!(rows.iter().all(|r| r.brand.as_deref() == Some("Acme")));
            }
            other => panic!("expected category sample, got {:?}", other),
        }
    }

    #[test]
    fn category_sample_is_capped_at_n() {
        assert_eq!(mixed_catalog().recommend(1, 2).rows().len(), 2);
    }

    #[test]
    fn category_without_stock_falls_back() {
        let outcome = mixed_catalog().recommend(3, 6);
        match outcome {
            SubstituteOutcome::Alternatives { reason, rows } => {
                assert_eq!(reason, FallbackReason::NoStockInCategory);
                assert_eq!(rows.len(), 5);
            }
            other => panic!("expected alternatives, got {:?}", other),
        }
    }

    #[test]
    fn product_without_category_substitutes_falls_back() {
        let outcome = mixed_catalog().recommend(107, 3);
        match outcome {
            SubstituteOutcome::Alternatives { reason, rows } => {
                assert_eq!(reason, FallbackReason::NoSubstitutesInCategory);
                assert_eq!(rows.len(), 3);
                assert!(rows.iter().all(|r| r.product_code != 107));
            }
            other => panic!("expected alternatives, got {:?}", other),
        }
    }

    #[test]
    fn nothing_in_stock_yields_empty_alternatives() {
        let rec = recommender(vec![
            row("A", 100, 1, "50.00", 0.10, 0),
            row("A", 101, 1, "55.00", 0.12, 0),
        ]);

        let outcome = rec.recommend(100, 6);
        assert!(matches!(
            outcome,
            SubstituteOutcome::Alternatives {
                reason: FallbackReason::NoSubstitutesInCategory,
                ..
            }
        ));
        assert!(outcome.rows().is_empty());
    }

    #[test]
    fn product_code_wins_over_category_code() {
        let rec = recommender(vec![
            row("A", 1, 5, "10.00", 0.10, 0),
            row("A", 2, 1, "10.00", 0.10, 3),
            row("A", 3, 5, "11.00", 0.10, 3),
        ]);

        assert!(matches!(rec.resolve(1), Resolution::Found(_)));
        assert_eq!(codes(&rec.recommend(1, 6)), vec![3]);
        assert_eq!(rec.resolve(5), Resolution::CategoryOnly(5));
        assert_eq!(rec.resolve(8), Resolution::Unresolved);
    }

    #[test]
    fn same_seed_gives_identical_results() {
        let rec = mixed_catalog();
        for code in [100, 1, 2, 9999] {
            assert_eq!(rec.recommend(code, 3), rec.recommend(code, 3));
        }

        let mut a = StdRng::seed_from_u64(99);
        let mut b = StdRng::seed_from_u64(99);
        assert_eq!(
            rec.recommend_with_rng(9999, 3, &mut a),
            rec.recommend_with_rng(9999, 3, &mut b)
        );
    }

    #[test]
    fn output_values_are_rounded() {
        let rec = recommender(vec![
            row("A", 100, 1, "50.00", 0.10, 0),
            row("A", 101, 1, "55.456", 0.12, 5),
        ]);

        let outcome = rec.recommend(100, 1);
        let r = &outcome.rows()[0];
        assert_eq!(r.unit_price, BigDecimal::from_str("55.46").unwrap());
        assert_eq!(r.margin_pct, 12.0);
        assert_eq!(r.brand.as_deref(), Some("Acme"));
    }

    #[test]
    fn in_stock_reference_still_gets_similar_products() {
        let rec = recommender(vec![
            row("A", 100, 1, "50.00", 0.10, 4),
            row("B", 101, 1, "55.00", 0.12, 5),
        ]);

        let outcome = rec.recommend(100, 6);
        assert_eq!(codes(&outcome), vec![101]);
        assert!(outcome.notice().contains("in stock"));
    }
}
