//! Composable match predicate.
//!
//! A `Predicate` is a flat list of typed clauses, all of which must hold.
//! `matches` evaluates it in memory; storage backends compile the same
//! clauses to their own query language.

use stockscope_core::{fold, InventoryRecord};

use crate::search::store::ProductRecords;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    /// Folded token occurs in at least one searchable field.
    Token(String),
    /// Some listed branch (any real branch when empty) has stock > 0.
    InStock(Vec<String>),
    /// Some listed branch has a record at all.
    PresentIn(Vec<String>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Predicate {
    clauses: Vec<Clause>,
}

impl Predicate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, clause: Clause) -> Self {
        self.clauses.push(clause);
        self
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Filter-only clauses for an already-selected branch list.
    pub fn for_filters(branches: &[String], only_in_stock: bool) -> Self {
        let mut p = Self::new();
        if only_in_stock {
            p = p.and(Clause::InStock(branches.to_vec()));
        }
        if !branches.is_empty() {
            p = p.and(Clause::PresentIn(branches.to_vec()));
        }
        p
    }

    /// One `Token` clause per folded token, then the filter clauses.
    pub fn for_search(tokens: &[String], branches: &[String], only_in_stock: bool) -> Self {
        let mut p = Self::new();
        for token in tokens {
            p = p.and(Clause::Token(token.clone()));
        }
        Self {
            clauses: p
                .clauses
                .into_iter()
                .chain(Self::for_filters(branches, only_in_stock).clauses)
                .collect(),
        }
    }

    pub fn matches(&self, product: &ProductRecords) -> bool {
        let mut doc: Option<SearchDocument> = None;
        self.clauses.iter().all(|clause| match clause {
            Clause::Token(token) => doc
                .get_or_insert_with(|| SearchDocument::from_record(&product.global))
                .contains(token),
            Clause::InStock(set) => product
                .branches
                .iter()
                .any(|r| r.stock > 0 && (set.is_empty() || set.contains(&r.branch))),
            Clause::PresentIn(set) => {
                set.is_empty() || product.branches.iter().any(|r| set.contains(&r.branch))
            }
        })
    }
}

/// Folded searchable fields of one record.
///
/// Built with `fold`, the same function applied to query tokens. Snapshot
/// writers store these values so SQL comparisons see identical text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchDocument {
    pub code: String,
    pub description: String,
    pub secondary_code: String,
    pub classification: String,
    pub branch: String,
}

impl SearchDocument {
    pub fn from_record(record: &InventoryRecord) -> Self {
        Self {
            code: fold(&record.code),
            description: fold(&record.description),
            secondary_code: record.secondary_code.as_deref().map(fold).unwrap_or_default(),
            classification: fold(record.classification.label()),
            branch: fold(&record.branch),
        }
    }

    /// `token` must already be folded.
    pub fn contains(&self, token: &str) -> bool {
        self.fields().iter().any(|f| f.contains(token))
    }

    pub fn fields(&self) -> [&str; 5] {
        [
            &self.description,
            &self.code,
            &self.secondary_code,
            &self.classification,
            &self.branch,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockscope_core::{Classification, GLOBAL_BRANCH};

    fn rec(code: &str, desc: &str, stock: i64, branch: &str) -> InventoryRecord {
        InventoryRecord {
            code: code.into(),
            description: desc.into(),
            secondary_code: Some("AQ-77".into()),
            stock,
            classification: Classification::C,
            branch: branch.into(),
        }
    }

    fn product(desc: &str, stocks: &[(&str, i64)]) -> ProductRecords {
        let total = stocks.iter().map(|(_, s)| s).sum();
        ProductRecords {
            global: rec("001", desc, total, GLOBAL_BRANCH),
            branches: stocks.iter().map(|(b, s)| rec("001", desc, *s, b)).collect(),
        }
    }

    fn tokens(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| fold(w)).collect()
    }

    #[test]
    fn every_token_must_match_some_field() {
        let p = product("Martillo Truper 16oz", &[("HI", 1)]);
        assert!(Predicate::for_search(&tokens(&["martillo", "truper"]), &[], false).matches(&p));
        assert!(Predicate::for_search(&tokens(&["MARTÍLLO", "001"]), &[], false).matches(&p));
        assert!(Predicate::for_search(&tokens(&["aq-77"]), &[], false).matches(&p));
        assert!(!Predicate::for_search(&tokens(&["martillo", "stanley"]), &[], false).matches(&p));
    }

    #[test]
    fn classification_and_branch_are_searchable() {
        let p = product("Foco", &[("HI", 1)]);
        assert!(Predicate::for_search(&tokens(&["foco", "c"]), &[], false).matches(&p));
        assert!(Predicate::for_search(&tokens(&["global"]), &[], false).matches(&p));
    }

    #[test]
    fn empty_predicate_matches_everything() {
        assert!(Predicate::new().matches(&product("x", &[])));
    }

    #[test]
    fn in_stock_respects_branch_selection() {
        let p = product("Pinzas", &[("HI", 0), ("EX", 4), ("MT", -2)]);
        assert!(Predicate::for_filters(&[], true).matches(&p));
        assert!(Predicate::for_filters(&["EX".into()], true).matches(&p));
        assert!(!Predicate::for_filters(&["HI".into(), "MT".into()], true).matches(&p));
    }

    #[test]
    fn presence_requires_a_row() {
        let p = product("Pinzas", &[("HI", 0)]);
        assert!(Predicate::for_filters(&["HI".into()], false).matches(&p));
        assert!(!Predicate::for_filters(&["SA".into()], false).matches(&p));
        assert!(Predicate::for_filters(&[], false).matches(&p));
    }

    #[test]
    fn filter_clauses_follow_tokens() {
        let p = Predicate::for_search(&tokens(&["a"]), &["HI".into()], true);
        assert_eq!(
            p.clauses(),
            &[
                Clause::Token("a".into()),
                Clause::InStock(vec!["HI".into()]),
                Clause::PresentIn(vec!["HI".into()]),
            ]
        );
    }
}
