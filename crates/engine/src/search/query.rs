use serde::{Deserialize, Serialize};

/// Result ordering. Every key falls back to folded description, then code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Description,
    StockAsc,
    StockDesc,
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Description => write!(f, "description"),
            Self::StockAsc => write!(f, "stock_asc"),
            Self::StockDesc => write!(f, "stock_desc"),
        }
    }
}

/// Caller-selected restrictions shared by search and detail.
///
/// An empty `branches` list means every real branch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filters {
    #[serde(default)]
    pub branches: Vec<String>,
    #[serde(default)]
    pub only_in_stock: bool,
    #[serde(default)]
    pub sort: SortKey,
}

impl Filters {
    pub fn in_branches<I, S>(mut self, branches: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.branches = branches.into_iter().map(Into::into).collect();
        self
    }

    pub fn only_in_stock(mut self) -> Self {
        self.only_in_stock = true;
        self
    }

    pub fn sorted_by(mut self, sort: SortKey) -> Self {
        self.sort = sort;
        self
    }
}
