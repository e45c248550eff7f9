use std::cmp::Ordering;

use stockscope_core::{fold, InventoryRecord};

use crate::search::query::SortKey;

/// Total order over Global records.
///
/// Text compares byte-wise on the folded description, then the raw
/// description, then the code, which is also how the snapshot's `ORDER BY`
/// sorts `norm_description, description, code`.
pub fn compare(a: &InventoryRecord, b: &InventoryRecord, sort: SortKey) -> Ordering {
    let by_text = || {
        fold(&a.description)
            .cmp(&fold(&b.description))
            .then_with(|| a.description.cmp(&b.description))
            .then_with(|| a.code.cmp(&b.code))
    };
    match sort {
        SortKey::Description => by_text(),
        SortKey::StockAsc => a.stock.cmp(&b.stock).then_with(by_text),
        SortKey::StockDesc => b.stock.cmp(&a.stock).then_with(by_text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockscope_core::{Classification, GLOBAL_BRANCH};

    fn g(code: &str, desc: &str, stock: i64) -> InventoryRecord {
        InventoryRecord {
            code: code.into(),
            description: desc.into(),
            secondary_code: None,
            stock,
            classification: Classification::A,
            branch: GLOBAL_BRANCH.into(),
        }
    }

    fn sorted(mut v: Vec<InventoryRecord>, sort: SortKey) -> Vec<String> {
        v.sort_by(|a, b| compare(a, b, sort));
        v.into_iter().map(|r| r.code).collect()
    }

    #[test]
    fn description_is_accent_and_case_insensitive() {
        let v = vec![g("1", "Tornillo", 0), g("2", "ÁNGULO", 0), g("3", "broca", 0)];
        assert_eq!(sorted(v, SortKey::Description), vec!["2", "3", "1"]);
    }

    #[test]
    fn equal_descriptions_fall_back_to_code() {
        let v = vec![g("B", "Foco", 0), g("A", "Foco", 0)];
        assert_eq!(sorted(v, SortKey::Description), vec!["A", "B"]);
    }

    #[test]
    fn stock_keys() {
        let v = vec![g("1", "a", 5), g("2", "b", -1), g("3", "c", 5)];
        assert_eq!(sorted(v.clone(), SortKey::StockAsc), vec!["2", "1", "3"]);
        assert_eq!(sorted(v, SortKey::StockDesc), vec!["1", "3", "2"]);
    }
}
