//! `stockscope-engine`: ingestion and search logic.
//!
//! Pure engine crate: receives raw tables or a storage handle, returns
//! records and result sets. File formats and SQLite live in `stockscope-io`.

pub mod error;
pub mod ingest;
pub mod search;

pub use error::{IngestError, StoreError};
pub use ingest::{build, BranchInput, BuildOutput, BuildReport, RawTable};
pub use search::{
    highlight, BranchStock, Clause, DetailOutcome, Filters, Highlight, InventoryStore,
    MemoryStore, Predicate, ProductDetail, ProductRecords, SearchDocument, SearchEngine,
    SearchHit, SearchIssue, SearchOptions, SearchResults, SortKey,
};
