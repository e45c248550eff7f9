use serde::Serialize;
use stockscope_core::{
    tokenize, BranchSet, Classification, InventoryRecord, MovementStatus, StockLevel,
    DEFAULT_MIN_QUERY_LEN, DEFAULT_RESULT_LIMIT,
};

use crate::search::detail::{DetailOutcome, ProductDetail};
use crate::search::highlight::{highlight, Highlight};
use crate::search::predicate::Predicate;
use crate::search::query::Filters;
use crate::search::store::InventoryStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    pub limit: usize,
    pub min_query_len: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_RESULT_LIMIT,
            min_query_len: DEFAULT_MIN_QUERY_LEN,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub code: String,
    pub description: String,
    pub secondary_code: Option<String>,
    pub stock: i64,
    pub classification: Classification,
    pub level: StockLevel,
    pub status: MovementStatus,
}

impl SearchHit {
    fn from_global(record: InventoryRecord) -> Self {
        Self {
            level: StockLevel::of(record.stock),
            status: MovementStatus::of(&record.classification, record.stock),
            code: record.code,
            description: record.description,
            secondary_code: record.secondary_code,
            stock: record.stock,
            classification: record.classification,
        }
    }

    pub fn highlighted_description(&self, query: &str) -> Highlight {
        highlight(&self.description, query)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SearchIssue {
    BadRequest { reason: String },
    /// Storage failed; the hit list is empty.
    Unavailable { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResults {
    pub query: String,
    pub hits: Vec<SearchHit>,
    /// More products matched than the result limit allows.
    pub truncated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue: Option<SearchIssue>,
}

impl SearchResults {
    fn failed(query: &str, issue: SearchIssue) -> Self {
        Self {
            query: query.to_string(),
            hits: Vec::new(),
            truncated: false,
            issue: Some(issue),
        }
    }
}

/// Stateless request handler over an `InventoryStore`.
///
/// Storage errors never escape: they are logged and reported as
/// `Unavailable`.
pub struct SearchEngine<S> {
    store: S,
    branches: BranchSet,
    options: SearchOptions,
}

impl<S: InventoryStore> SearchEngine<S> {
    pub fn new(store: S, branches: BranchSet, options: SearchOptions) -> Self {
        Self {
            store,
            branches,
            options,
        }
    }

    pub fn options(&self) -> SearchOptions {
        self.options
    }

    pub fn search(&self, query: &str, filters: &Filters) -> SearchResults {
        let trimmed = query.trim();
        if trimmed.chars().count() < self.options.min_query_len {
            return SearchResults::failed(
                trimmed,
                SearchIssue::BadRequest {
                    reason: format!(
                        "query must be at least {} character(s)",
                        self.options.min_query_len
                    ),
                },
            );
        }
        let tokens = tokenize(trimmed);
        if tokens.is_empty() {
            return SearchResults::failed(
                trimmed,
                SearchIssue::BadRequest {
                    reason: "query has no searchable text".into(),
                },
            );
        }
        let selected = match self.select_branches(&filters.branches) {
            Ok(b) => b,
            Err(reason) => {
                return SearchResults::failed(trimmed, SearchIssue::BadRequest { reason })
            }
        };

        let predicate = Predicate::for_search(&tokens, &selected, filters.only_in_stock);
        let limit = self.options.limit;
        match self
            .store
            .find_products(&predicate, filters.sort, limit.saturating_add(1))
        {
            Ok(mut records) => {
                let truncated = records.len() > limit;
                records.truncate(limit);
                SearchResults {
                    query: trimmed.to_string(),
                    hits: records.into_iter().map(SearchHit::from_global).collect(),
                    truncated,
                    issue: None,
                }
            }
            Err(e) => {
                log::error!("search {trimmed:?} failed: {e}");
                SearchResults::failed(
                    trimmed,
                    SearchIssue::Unavailable {
                        message: e.to_string(),
                    },
                )
            }
        }
    }

    pub fn detail(&self, code: &str, filters: &Filters) -> DetailOutcome {
        let code = code.trim();
        if code.is_empty() {
            return DetailOutcome::BadRequest {
                reason: "product code is empty".into(),
            };
        }
        let selected = match self.select_branches(&filters.branches) {
            Ok(b) => b,
            Err(reason) => return DetailOutcome::BadRequest { reason },
        };

        let product = match self.store.product(code) {
            Ok(Some(p)) => p,
            Ok(None) => return DetailOutcome::UnknownCode,
            Err(e) => {
                log::error!("detail {code:?} failed: {e}");
                return DetailOutcome::Unavailable {
                    message: e.to_string(),
                };
            }
        };

        if !Predicate::for_filters(&selected, filters.only_in_stock).matches(&product) {
            return DetailOutcome::FilteredOut;
        }

        let shown: Vec<&str> = if selected.is_empty() {
            self.branches.iter().collect()
        } else {
            selected.iter().map(String::as_str).collect()
        };
        DetailOutcome::Found(ProductDetail::assemble(&product, &shown))
    }

    /// Canonical names in branch priority order, duplicates removed.
    fn select_branches(&self, requested: &[String]) -> Result<Vec<String>, String> {
        let mut selected: Vec<String> = Vec::with_capacity(requested.len());
        for name in requested {
            let canonical = self
                .branches
                .resolve(name)
                .ok_or_else(|| format!("unknown branch '{}'", name.trim()))?;
            if !selected.iter().any(|s| s == canonical) {
                selected.push(canonical.to_string());
            }
        }
        selected.sort_by_key(|b| self.branches.rank(b));
        Ok(selected)
    }
}
