//! `stockscope-core` : shared inventory types.
//!
//! Plain data only: no I/O, no storage. Every other crate in the workspace
//! speaks in these types.

pub mod branch;
pub mod columns;
pub mod fold;
pub mod record;
pub mod status;

pub use branch::{BranchSet, GLOBAL_BRANCH};
pub use columns::{ColumnRule, ColumnRules, Field};
pub use fold::{fold, tokenize};
pub use record::{Classification, InventoryRecord};
pub use status::{MovementStatus, StockLevel};

/// Maximum number of products a search returns unless configured otherwise.
pub const DEFAULT_RESULT_LIMIT: usize = 100;

/// Shorter queries are rejected as bad requests.
pub const DEFAULT_MIN_QUERY_LEN: usize = 2;
