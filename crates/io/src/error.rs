use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: malformed CSV: {message}")]
    Csv { path: PathBuf, message: String },
    #[error("{path}: cannot read workbook: {message}")]
    Workbook { path: PathBuf, message: String },
    #[error("{path}: no sheet named '{sheet}'")]
    MissingSheet { path: PathBuf, sheet: String },
    #[error("{path}: no sheet name starts with '{prefix}'")]
    NoBranchSheets { path: PathBuf, prefix: String },
    #[error("snapshot {path}: {source}")]
    Snapshot {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },
    #[error("snapshot {path}: {message}")]
    BadSnapshot { path: PathBuf, message: String },
    #[error("cannot replace snapshot {path}: {source}")]
    Replace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl IoError {
    pub(crate) fn snapshot(path: &std::path::Path) -> impl FnOnce(rusqlite::Error) -> Self + '_ {
        move |source| Self::Snapshot {
            path: path.to_path_buf(),
            source,
        }
    }
}
