// File I/O: branch exports in, inventory snapshot out

pub mod csv;
pub mod error;
pub mod snapshot;
pub mod sources;
pub mod xlsx;

pub use error::IoError;
pub use snapshot::{read_meta, write_snapshot, SnapshotMeta, SqliteStore, SNAPSHOT_FORMAT_VERSION};
pub use sources::collect_inputs;
