//! 频繁项集挖掘 (Apriori) 与关联规则生成
//!
//! 输入是按发票聚合后的购物篮, 先做独热编码, 再逐层生成候选项集:
//!
//! 1. 频繁 1-项集 (support >= min_support)
//! 2. 由频繁 (k-1)-项集连接生成 k-项集候选, 剪掉含非频繁子集的候选
//! 3. 统计支持度, 过滤; 重复直到没有候选或达到 max_len
//! 4. 每个频繁项集 (长度 >= 2) 拆成 antecedent => consequent, 按 lift 过滤

use crate::models::AssociationRule;
use std::collections::{BTreeSet, HashMap, HashSet};

/// 独热编码后的购物篮: 每行一张发票, 每列一个商品编码 (升序)
#[derive(Debug, Clone, Default)]
pub struct OneHotBaskets {
    columns: Vec<i64>,
    rows: Vec<Vec<bool>>,
}

impl OneHotBaskets {
    pub fn encode<'a, I>(baskets: I) -> Self
    where
        I: IntoIterator<Item = &'a BTreeSet<i64>>,
    {
        let baskets: Vec<&BTreeSet<i64>> = baskets.into_iter().collect();
        let columns: Vec<i64> = baskets
            .iter()
            .flat_map(|b| b.iter().copied())
            .collect::<BTreeSet<i64>>()
            .into_iter()
            .collect();
        let index: HashMap<i64, usize> = columns
            .iter()
            .enumerate()
            .map(|(idx, code)| (*code, idx))
            .collect();

        let rows = baskets
            .iter()
            .map(|basket| {
                let mut row = vec![false; columns.len()];
                for code in basket.iter() {
                    row[index[code]] = true;
                }
                row
            })
            .collect();

        Self { columns, rows }
    }

    pub fn columns(&self) -> &[i64] {
        &self.columns
    }

    /// 购物篮数量
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn support(&self, itemset: &[usize]) -> f64 {
        if self.rows.is_empty() {
            return 0.0;
        }
        let count = self
            .rows
            .iter()
            .filter(|row| itemset.iter().all(|&col| row[col]))
            .count();
        count as f64 / self.rows.len() as f64
    }
}

/// 频繁项集 (商品编码升序)
#[derive(Debug, Clone, PartialEq)]
pub struct FrequentItemset {
    pub items: Vec<i64>,
    pub support: f64,
}

#[derive(Debug, Clone)]
pub struct Apriori {
    min_support: f64,
    max_len: usize,
}

impl Apriori {
    pub fn new(min_support: f64, max_len: usize) -> Self {
        Self {
            min_support,
            max_len,
        }
    }

    /// 返回所有频繁项集, 按长度、再按编码排序
    pub fn frequent_itemsets(&self, baskets: &OneHotBaskets) -> Vec<FrequentItemset> {
        if baskets.is_empty() || self.max_len == 0 {
            return Vec::new();
        }

        let mut found: Vec<(Vec<usize>, f64)> = Vec::new();
        let mut current: Vec<(Vec<usize>, f64)> = (0..baskets.columns.len())
            .filter_map(|col| {
                let support = baskets.support(&[col]);
                (support >= self.min_support).then(|| (vec![col], support))
            })
            .collect();

        let mut level = 1;
        while !current.is_empty() {
            found.extend(current.iter().cloned());
            if level >= self.max_len {
                break;
            }

            current = Self::generate_candidates(&current)
                .into_iter()
                .filter_map(|candidate| {
                    let support = baskets.support(&candidate);
                    (support >= self.min_support).then_some((candidate, support))
                })
                .collect();
            level += 1;
        }

        found
            .into_iter()
            .map(|(cols, support)| FrequentItemset {
                items: cols.iter().map(|&c| baskets.columns[c]).collect(),
                support,
            })
            .collect()
    }

    /// 连接: 前 k-2 项相同的两个 (k-1)-项集合并; 剪枝: 所有 (k-1)-子集必须频繁
    fn generate_candidates(prev: &[(Vec<usize>, f64)]) -> Vec<Vec<usize>> {
        let frequent: HashSet<&[usize]> = prev.iter().map(|(items, _)| items.as_slice()).collect();
        let mut candidates = Vec::new();

        for i in 0..prev.len() {
            for j in (i + 1)..prev.len() {
                let (a, b) = (&prev[i].0, &prev[j].0);
                let k = a.len();
                if a[..k - 1] != b[..k - 1] {
                    continue;
                }

                let mut candidate = a.clone();
                let (lo, hi) = if a[k - 1] < b[k - 1] {
                    (a[k - 1], b[k - 1])
                } else {
                    (b[k - 1], a[k - 1])
                };
                candidate[k - 1] = lo;
                candidate.push(hi);

                if Self::has_infrequent_subset(&candidate, &frequent) {
                    continue;
                }
                candidates.push(candidate);
            }
        }

        candidates
    }

    fn has_infrequent_subset(candidate: &[usize], frequent: &HashSet<&[usize]>) -> bool {
        (0..candidate.len()).any(|skip| {
            let subset: Vec<usize> = candidate
                .iter()
                .enumerate()
                .filter(|(idx, _)| *idx != skip)
                .map(|(_, &col)| col)
                .collect();
            !frequent.contains(subset.as_slice())
        })
    }
}

/// 由频繁项集生成关联规则, 保留 lift >= min_lift 的规则
pub fn association_rules(itemsets: &[FrequentItemset], min_lift: f64) -> Vec<AssociationRule> {
    let supports: HashMap<&[i64], f64> = itemsets
        .iter()
        .map(|fi| (fi.items.as_slice(), fi.support))
        .collect();
    let mut rules = Vec::new();

    for itemset in itemsets.iter().filter(|fi| fi.items.len() >= 2) {
        let n = itemset.items.len();
        for mask in 1..((1usize << n) - 1) {
            let (antecedent, consequent): (Vec<(usize, i64)>, Vec<(usize, i64)>) = itemset
                .items
                .iter()
                .copied()
                .enumerate()
                .partition(|(idx, _)| mask & (1usize << *idx) != 0);
            let antecedent: Vec<i64> = antecedent.into_iter().map(|(_, c)| c).collect();
            let consequent: Vec<i64> = consequent.into_iter().map(|(_, c)| c).collect();

            // 向下封闭性保证子集一定在频繁项集中
            let (Some(&antecedent_support), Some(&consequent_support)) = (
                supports.get(antecedent.as_slice()),
                supports.get(consequent.as_slice()),
            ) else {
                continue;
            };

            let confidence = itemset.support / antecedent_support;
            let lift = itemset.support / (antecedent_support * consequent_support);
            if lift >= min_lift {
                rules.push(AssociationRule {
                    antecedent,
                    consequent,
                    antecedent_support,
                    consequent_support,
                    support: itemset.support,
                    confidence,
                    lift,
                });
            }
        }
    }

    rules
}

#[cfg(test)]
mod tests {
    use super::*;

    fn baskets(raw: &[&[i64]]) -> Vec<BTreeSet<i64>> {
        raw.iter().map(|b| b.iter().copied().collect()).collect()
    }

    fn support_of(itemsets: &[FrequentItemset], items: &[i64]) -> Option<f64> {
        itemsets
            .iter()
            .find(|fi| fi.items == items)
            .map(|fi| fi.support)
    }

    #[test]
    fn encode_builds_sorted_columns() {
        let raw = baskets(&[&[300, 100], &[200, 100]]);
        let encoded = OneHotBaskets::encode(&raw);

        assert_eq!(encoded.columns(), &[100, 200, 300]);
        assert_eq!(encoded.len(), 2);
        assert_eq!(encoded.rows[0], vec![true, false, true]);
        assert_eq!(encoded.rows[1], vec![true, true, false]);
    }

    #[test]
    fn support_threshold_prunes_rare_pairs() {
        let raw = baskets(&[&[100, 200], &[100, 200], &[100, 300]]);
        let itemsets = Apriori::new(0.5, 3).frequent_itemsets(&OneHotBaskets::encode(&raw));

        assert_eq!(support_of(&itemsets, &[100]), Some(1.0));
        let pair = support_of(&itemsets, &[100, 200]).expect("{100,200} is frequent");
        assert!((pair - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(support_of(&itemsets, &[300]), None);
        assert_eq!(support_of(&itemsets, &[100, 300]), None);
    }

    #[test]
    fn max_len_caps_itemset_size() {
        let raw = baskets(&[&[1, 2, 3], &[1, 2, 3], &[1, 2]]);
        let encoded = OneHotBaskets::encode(&raw);

        let capped = Apriori::new(0.5, 2).frequent_itemsets(&encoded);
        assert!(capped.iter().all(|fi| fi.items.len() <= 2));
        assert_eq!(capped.len(), 6);

        let full = Apriori::new(0.5, 3).frequent_itemsets(&encoded);
        let triple = support_of(&full, &[1, 2, 3]).expect("triple is frequent");
        assert!((triple - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn candidates_with_infrequent_subsets_are_pruned() {
        // {1,3} 与 {2,3} 不频繁, {1,2,3} 不应作为候选
        let raw = baskets(&[&[1, 2], &[1, 2], &[1, 3], &[2, 3]]);
        let itemsets = Apriori::new(0.5, 3).frequent_itemsets(&OneHotBaskets::encode(&raw));

        assert!(support_of(&itemsets, &[1, 2]).is_some());
        assert!(support_of(&itemsets, &[1, 3]).is_none());
        assert!(itemsets.iter().all(|fi| fi.items.len() <= 2));
    }

    #[test]
    fn empty_input_has_no_itemsets() {
        let none: Vec<BTreeSet<i64>> = Vec::new();
        assert!(Apriori::new(0.1, 2)
            .frequent_itemsets(&OneHotBaskets::encode(&none))
            .is_empty());
    }

    #[test]
    fn rules_carry_confidence_and_lift() {
        let raw = baskets(&[&[1, 2], &[1, 2], &[1, 3], &[3]]);
        let itemsets = Apriori::new(0.25, 2).frequent_itemsets(&OneHotBaskets::encode(&raw));
        let rules = association_rules(&itemsets, 0.0);

        let rule = rules
            .iter()
            .find(|r| r.antecedent == vec![2] && r.consequent == vec![1])
            .expect("2 => 1");
        assert!((rule.support - 0.5).abs() < 1e-12);
        assert!((rule.confidence - 1.0).abs() < 1e-12);
        // support({1}) = 0.75
        assert!((rule.lift - 1.0 / 0.75).abs() < 1e-12);

        let reverse = rules
            .iter()
            .find(|r| r.antecedent == vec![1] && r.consequent == vec![2])
            .expect("1 => 2");
        assert!((reverse.confidence - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn lift_threshold_filters_rules() {
        let raw = baskets(&[&[1, 2], &[1, 2], &[1, 3], &[3]]);
        let itemsets = Apriori::new(0.25, 2).frequent_itemsets(&OneHotBaskets::encode(&raw));

        let rules = association_rules(&itemsets, 1.0);
        assert!(!rules.is_empty());
        assert!(rules.iter().all(|r| r.lift >= 1.0));
        // {1,3}: 0.25 / (0.75 * 0.5) < 1
        assert!(!rules.iter().any(|r| r.antecedent == vec![1] && r.consequent == vec![3]));
    }

    #[test]
    fn three_item_sets_yield_all_splits() {
        let raw = baskets(&[&[1, 2, 3], &[1, 2, 3]]);
        let itemsets = Apriori::new(0.5, 3).frequent_itemsets(&OneHotBaskets::encode(&raw));
        let rules = association_rules(&itemsets, 0.0);

        let from_triple = rules
            .iter()
            .filter(|r| r.antecedent.len() + r.consequent.len() == 3)
            .count();
        assert_eq!(from_triple, 6);
        assert!(rules
            .iter()
            .any(|r| r.antecedent == vec![1, 3] && r.consequent == vec![2]));
    }
}
