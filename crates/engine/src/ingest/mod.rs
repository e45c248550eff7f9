//! Ingestion/aggregation builder.
//!
//! Raw per-branch tables come in, the canonical record set goes out:
//!
//! 1. `load_branch` locates the columns and slices out raw rows
//! 2. `clean_row` trims, sanitizes stock, defaults classification
//! 3. `aggregate` sums duplicate (code, branch) rows and derives Global
//!
//! `build` drives all three across branches and applies the failure
//! policy: a bad branch is skipped, zero good branches is fatal.

mod aggregate;
mod build;
mod clean;
mod load;
mod table;

pub use aggregate::aggregate;
pub use build::{build, BranchInput, BranchReport, BuildOutput, BuildReport, SkippedBranch};
pub use clean::{clean_row, parse_stock, CleanRow};
pub use load::{load_branch, RawRow, HEADER_SCAN_ROWS};
pub use table::RawTable;
