use stockscope_core::Field;

use crate::ingest::SkippedBranch;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// Required columns could not be located in a branch table.
    #[error("{table}: missing column(s) {}; available: {}", list(.missing), .available.join(", "))]
    MissingColumns {
        table: String,
        missing: Vec<Field>,
        available: Vec<String>,
    },
    /// Two required fields resolved to the same column, e.g. a title cell
    /// that happens to contain every alias.
    #[error("{table}: column '{header}' matches both {} and {}", .first.name(), .second.name())]
    SharedColumn {
        table: String,
        header: String,
        first: Field,
        second: Field,
    },
    /// A table with no rows at all.
    #[error("{table}: table is empty")]
    EmptyTable { table: String },
    /// Every branch was unreadable. Fatal: the build is aborted.
    #[error("no branch could be read ({} skipped)", .skipped.len())]
    NoBranchesRead { skipped: Vec<SkippedBranch> },
    /// Branches were read but none produced a usable row.
    #[error("no inventory rows with a product code were found")]
    NoRecords,
}

/// Failure inside an `InventoryStore`. Never escapes `SearchEngine`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("cannot open inventory snapshot {path}: {message}")]
    Open { path: String, message: String },
    /// Snapshot exists but does not have the expected layout.
    #[error("inventory snapshot has an unexpected layout: {0}")]
    Schema(String),
    #[error("inventory query failed: {0}")]
    Query(String),
}

fn list(fields: &[Field]) -> String {
    fields.iter().map(Field::name).collect::<Vec<_>>().join(", ")
}
