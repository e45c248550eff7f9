//! Search & match engine.
//!
//! Matching policy: **conjunctive substring match**. A product matches when
//! every folded query token occurs in at least one of its Global record's
//! folded code, description, secondary code, classification or branch.
//! Filters are extra clauses ANDed onto the same `Predicate`.

mod detail;
mod engine;
mod highlight;
mod predicate;
mod query;
mod rank;
mod store;

pub use detail::{BranchStock, DetailOutcome, ProductDetail, NOT_AVAILABLE};
pub use engine::{SearchEngine, SearchHit, SearchIssue, SearchOptions, SearchResults};
pub use highlight::{highlight, strip_markers, Highlight, MARK_CLOSE, MARK_OPEN};
pub use predicate::{Clause, Predicate, SearchDocument};
pub use query::{Filters, SortKey};
pub use rank::compare;
pub use store::{InventoryStore, MemoryStore, ProductRecords};
