use std::collections::BTreeMap;

use stockscope_core::{BranchSet, InventoryRecord};

use crate::error::StoreError;
use crate::search::predicate::Predicate;
use crate::search::query::SortKey;
use crate::search::rank::compare;

/// Every record of one product code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRecords {
    pub global: InventoryRecord,
    /// Branch rows in branch priority order, Global excluded.
    pub branches: Vec<InventoryRecord>,
}

impl ProductRecords {
    pub fn branch(&self, name: &str) -> Option<&InventoryRecord> {
        self.branches.iter().find(|r| r.branch == name)
    }
}

/// Read access to an aggregated inventory table.
///
/// Implementations must apply `predicate` to the product's Global record
/// and branch rows exactly as `Predicate::matches` does, and order results
/// with `compare`.
pub trait InventoryStore {
    /// Global records of matching products, sorted, at most `limit`.
    fn find_products(
        &self,
        predicate: &Predicate,
        sort: SortKey,
        limit: usize,
    ) -> Result<Vec<InventoryRecord>, StoreError>;

    /// All records for `code`, or `None` if the code is unknown.
    fn product(&self, code: &str) -> Result<Option<ProductRecords>, StoreError>;
}

impl<T: InventoryStore + ?Sized> InventoryStore for &T {
    fn find_products(
        &self,
        predicate: &Predicate,
        sort: SortKey,
        limit: usize,
    ) -> Result<Vec<InventoryRecord>, StoreError> {
        (**self).find_products(predicate, sort, limit)
    }

    fn product(&self, code: &str) -> Result<Option<ProductRecords>, StoreError> {
        (**self).product(code)
    }
}

/// In-memory store over an aggregated table. Reference implementation for
/// tests and small datasets.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    products: BTreeMap<String, ProductRecords>,
}

impl MemoryStore {
    pub fn new(records: Vec<InventoryRecord>, branches: &BranchSet) -> Self {
        let mut globals: BTreeMap<String, InventoryRecord> = BTreeMap::new();
        let mut rows: BTreeMap<String, Vec<InventoryRecord>> = BTreeMap::new();
        for record in records {
            if record.is_global() {
                globals.insert(record.code.clone(), record);
            } else {
                rows.entry(record.code.clone()).or_default().push(record);
            }
        }

        let mut products = BTreeMap::new();
        for (code, global) in globals {
            let mut branch_rows = rows.remove(&code).unwrap_or_default();
            branch_rows.sort_by_key(|r| branches.rank(&r.branch));
            products.insert(
                code,
                ProductRecords {
                    global,
                    branches: branch_rows,
                },
            );
        }
        for code in rows.keys() {
            log::warn!("code {code}: branch rows without a Global record are not searchable");
        }
        Self { products }
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

impl InventoryStore for MemoryStore {
    fn find_products(
        &self,
        predicate: &Predicate,
        sort: SortKey,
        limit: usize,
    ) -> Result<Vec<InventoryRecord>, StoreError> {
        let mut hits: Vec<&InventoryRecord> = self
            .products
            .values()
            .filter(|p| predicate.matches(p))
            .map(|p| &p.global)
            .collect();
        hits.sort_by(|a, b| compare(a, b, sort));
        Ok(hits.into_iter().take(limit).cloned().collect())
    }

    fn product(&self, code: &str) -> Result<Option<ProductRecords>, StoreError> {
        Ok(self.products.get(code).cloned())
    }
}
