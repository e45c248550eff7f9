// Property-based tests for the search engine over the in-memory store.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use std::collections::BTreeSet;

use proptest::prelude::*;
use stockscope_core::{fold, BranchSet, Classification, InventoryRecord};
use stockscope_engine::ingest::{aggregate, CleanRow};
use stockscope_engine::{Filters, MemoryStore, SearchEngine, SearchOptions};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

const WORDS: &[&str] = &[
    "martillo", "Truper", "tínaco", "PINZAS", "llave", "16oz", "goma", "cinta", "Foco", "ñandú",
];

const BRANCHES: &[&str] = &["HI", "EX", "MT", "SA", "ADE"];

fn arb_description() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(WORDS), 1..4).prop_map(|w| w.join(" "))
}

/// Branch rows for up to 12 product codes.
fn arb_rows() -> impl Strategy<Value = Vec<InventoryRecord>> {
    prop::collection::vec(
        (
            0u8..12,
            arb_description(),
            prop::sample::select(BRANCHES),
            -5i64..20,
            prop::sample::select(vec!["A", "B", "C", ""]),
        ),
        1..40,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .map(|(code, desc, branch, stock, class)| InventoryRecord {
                code: format!("{code:03}"),
                description: desc,
                secondary_code: None,
                stock,
                classification: Classification::parse(class),
                branch: branch.to_string(),
            })
            .collect()
    })
}

fn arb_query() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(prop::sample::select(WORDS).prop_map(str::to_string), 1..4)
}

fn engine(rows: Vec<InventoryRecord>) -> (SearchEngine<MemoryStore>, Vec<InventoryRecord>) {
    let branches = BranchSet::default();
    let records = aggregate(rows.into_iter().map(CleanRow::from).collect(), &branches);
    let store = MemoryStore::new(records.clone(), &branches);
    let options = SearchOptions {
        limit: usize::MAX - 1,
        min_query_len: 1,
    };
    (SearchEngine::new(store, branches, options), records)
}

fn hit_codes(engine: &SearchEngine<MemoryStore>, query: &str, filters: &Filters) -> BTreeSet<String> {
    let results = engine.search(query, filters);
    assert!(results.issue.is_none(), "unexpected issue: {:?}", results.issue);
    results.hits.into_iter().map(|h| h.code).collect()
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    /// A product is returned iff every token matches one of its Global fields.
    #[test]
    fn conjunctive_matching(rows in arb_rows(), query in arb_query()) {
        let (engine, records) = engine(rows);
        let got = hit_codes(&engine, &query.join(" "), &Filters::default());

        let expected: BTreeSet<String> = records
            .iter()
            .filter(|r| r.is_global())
            .filter(|g| {
                let fields = [fold(&g.description), fold(&g.code), fold(g.classification.label()), fold(&g.branch)];
                query.iter().all(|t| fields.iter().any(|f| f.contains(&fold(t))))
            })
            .map(|g| g.code.clone())
            .collect();
        prop_assert_eq!(got, expected);
    }

    /// Dropping a token never shrinks the result set.
    #[test]
    fn removing_a_token_is_monotone(rows in arb_rows(), query in arb_query(), drop in any::<prop::sample::Index>()) {
        prop_assume!(query.len() > 1);
        let (engine, _) = engine(rows);
        let full = hit_codes(&engine, &query.join(" "), &Filters::default());

        let mut fewer = query.clone();
        fewer.remove(drop.index(query.len()));
        let relaxed = hit_codes(&engine, &fewer.join(" "), &Filters::default());

        prop_assert!(full.is_subset(&relaxed));
    }

    /// Every in-stock hit has a selected branch holding stock.
    #[test]
    fn only_in_stock_guarantee(
        rows in arb_rows(),
        query in arb_query(),
        selection in prop::sample::subsequence(BRANCHES.to_vec(), 0..3),
    ) {
        let (engine, records) = engine(rows);
        let filters = Filters::default().in_branches(selection.iter().copied()).only_in_stock();
        for code in hit_codes(&engine, &query.join(" "), &filters) {
            let ok = records.iter().any(|r| {
                r.code == code
                    && !r.is_global()
                    && r.stock > 0
                    && (selection.is_empty() || selection.contains(&r.branch.as_str()))
            });
            prop_assert!(ok, "{} has no stock in {:?}", code, selection);
        }
    }

    /// Filtering only ever removes products.
    #[test]
    fn filters_narrow(rows in arb_rows(), query in arb_query(), branch in prop::sample::select(BRANCHES)) {
        let (engine, _) = engine(rows);
        let q = query.join(" ");
        let all = hit_codes(&engine, &q, &Filters::default());
        let narrowed = hit_codes(&engine, &q, &Filters::default().in_branches([branch]).only_in_stock());
        prop_assert!(narrowed.is_subset(&all));
    }
}
