use crate::models::{CrossSellOutcome, SubstituteOutcome};
use crate::service::QueryReport;
use std::fmt::Write;

/// 控制台最多展示的关联规则数
pub const MAX_ASSOCIATIONS_SHOWN: usize = 6;

/// 查询结果的文本报告
pub fn render(report: &QueryReport) -> String {
    let mut out = String::new();

    let described = report.query_description.as_deref().unwrap_or("not found");
    let _ = writeln!(out, "Query {} ({})", report.query_code, described);
    let _ = writeln!(out);

    let _ = writeln!(out, "Substitutes: {}", report.substitutes.notice());
    if let SubstituteOutcome::Substitutes { reference, .. } = &report.substitutes {
        let _ = writeln!(
            out,
            "  reference: {} - R$ {} - margin {:.2}% - stock {}",
            reference.description,
            reference.unit_price.round(2),
            reference.margin_pct * 100.0,
            reference.stock_quantity
        );
    }
    let _ = writeln!(
        out,
        "  {:>8}  {:<40} {:>10} {:>8} {:>7}  {}",
        "code", "description", "price", "margin%", "stock", "category"
    );
    for row in report.substitutes.rows() {
        let _ = writeln!(
            out,
            "  {:>8}  {:<40} {:>10} {:>8.2} {:>7}  {}",
            row.product_code,
            truncate(&row.description, 40),
            row.unit_price.to_string(),
            row.margin_pct,
            row.stock_quantity,
            row.category
        );
    }
    let _ = writeln!(out);

    match &report.cross_sell {
        CrossSellOutcome::NoFrequentItemsets | CrossSellOutcome::NoRulesForProduct => {
            let _ = writeln!(out, "No products frequently bought together.");
        }
        CrossSellOutcome::Rules(rules) => {
            let _ = writeln!(
                out,
                "Frequently bought together ({} rules, showing up to {}):",
                rules.len(),
                MAX_ASSOCIATIONS_SHOWN
            );
            for rule in report.associations.iter().take(MAX_ASSOCIATIONS_SHOWN) {
                let _ = writeln!(
                    out,
                    "  {} {} -> {} {}  together {}  confidence {}  lift {:.2}",
                    rule.antecedent_code,
                    truncate(&rule.antecedent_description, 30),
                    rule.consequent_code,
                    truncate(&rule.consequent_description, 30),
                    rule.support,
                    rule.confidence,
                    rule.lift
                );
            }
        }
    }

    out
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RecommenderConfig;
    use crate::models::transaction::fixtures::row;
    use crate::models::TransactionTable;
    use crate::service::RecommendationService;
    use std::sync::Arc;

    fn service() -> RecommendationService {
        let table = TransactionTable::new(vec![
            row("A", 100, 1, "50.00", 0.10, 0),
            row("A", 101, 1, "55.00", 0.12, 5),
            row("B", 100, 1, "50.00", 0.10, 0),
            row("B", 101, 1, "55.00", 0.12, 5),
        ])
        .expect("valid table");
        RecommendationService::new(Arc::new(table), RecommenderConfig::default())
    }

    #[test]
    fn report_lists_substitutes_and_associations() {
        let text = render(&service().query(100).expect("query succeeds"));

        assert!(text.starts_with("Query 100 (Product 100)"));
        assert!(text.contains("Product 101"));
        assert!(text.contains("together 100.00%"));
    }

    #[test]
    fn report_for_unknown_code_says_not_found() {
        let text = render(&service().query(4242).expect("query succeeds"));
        assert!(text.starts_with("Query 4242 (not found)"));
        assert!(text.contains("No products frequently bought together."));
    }

    #[test]
    fn long_descriptions_are_truncated() {
        assert_eq!(truncate("abcdef", 4), "abc…");
        assert_eq!(truncate("abc", 4), "abc");
    }
}
