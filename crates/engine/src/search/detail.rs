use serde::Serialize;
use stockscope_core::{Classification, MovementStatus, StockLevel};

use crate::search::store::ProductRecords;

/// Classification label shown for branches that do not carry the product.
pub const NOT_AVAILABLE: &str = "N/A";

/// One branch line of a product detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchStock {
    pub branch: String,
    /// `false` for sentinel rows: stock 0 and no classification.
    pub present: bool,
    pub stock: i64,
    pub classification: Option<Classification>,
    pub level: StockLevel,
    pub status: Option<MovementStatus>,
}

impl BranchStock {
    fn absent(branch: &str) -> Self {
        Self {
            branch: branch.to_string(),
            present: false,
            stock: 0,
            classification: None,
            level: StockLevel::Empty,
            status: None,
        }
    }

    pub fn classification_label(&self) -> &str {
        self.classification
            .as_ref()
            .map(Classification::label)
            .unwrap_or(NOT_AVAILABLE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductDetail {
    pub code: String,
    pub description: String,
    pub secondary_code: Option<String>,
    /// Global stock across every real branch, not just the selected ones.
    pub total: i64,
    pub classification: Classification,
    pub level: StockLevel,
    pub status: MovementStatus,
    pub branches: Vec<BranchStock>,
}

impl ProductDetail {
    /// `shown` must already be canonical and in branch priority order.
    pub(crate) fn assemble(product: &ProductRecords, shown: &[&str]) -> Self {
        let g = &product.global;
        let branches = shown
            .iter()
            .map(|name| match product.branch(name) {
                Some(r) => BranchStock {
                    branch: r.branch.clone(),
                    present: true,
                    stock: r.stock,
                    classification: Some(r.classification.clone()),
                    level: StockLevel::of(r.stock),
                    status: Some(MovementStatus::of(&r.classification, r.stock)),
                },
                None => BranchStock::absent(name),
            })
            .collect();

        Self {
            code: g.code.clone(),
            description: g.description.clone(),
            secondary_code: g.secondary_code.clone(),
            total: g.stock,
            classification: g.classification.clone(),
            level: StockLevel::of(g.stock),
            status: MovementStatus::of(&g.classification, g.stock),
            branches,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DetailOutcome {
    Found(ProductDetail),
    UnknownCode,
    /// The code exists but the active filters exclude it.
    FilteredOut,
    BadRequest { reason: String },
    Unavailable { message: String },
}

impl DetailOutcome {
    pub fn found(&self) -> Option<&ProductDetail> {
        match self {
            Self::Found(d) => Some(d),
            _ => None,
        }
    }
}
