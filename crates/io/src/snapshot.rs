// Inventory snapshot: the aggregated table in SQLite

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OpenFlags, Row};
use serde::Serialize;
use stockscope_core::{BranchSet, Classification, InventoryRecord, GLOBAL_BRANCH};
use stockscope_engine::{
    BuildReport, Clause, InventoryStore, Predicate, ProductRecords, SearchDocument, SortKey,
    StoreError,
};

use crate::error::IoError;

/// Snapshot layout version.
/// Increment when the schema changes in a way that old readers can't handle.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

const SCHEMA: &str = r#"
CREATE TABLE inventory (
    code TEXT NOT NULL,
    description TEXT NOT NULL,
    secondary_code TEXT,             -- NULL when the product has none
    stock INTEGER NOT NULL,
    classification TEXT NOT NULL,
    branch TEXT NOT NULL,            -- real branch or 'Global'
    branch_rank INTEGER NOT NULL,    -- priority order, Global last
    norm_code TEXT NOT NULL,
    norm_description TEXT NOT NULL,
    norm_secondary_code TEXT NOT NULL,
    norm_classification TEXT NOT NULL,
    norm_branch TEXT NOT NULL,
    PRIMARY KEY (code, branch)
);

CREATE INDEX idx_inventory_branch ON inventory (branch, norm_description);

CREATE TABLE meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

const RECORD_COLUMNS: &str = "code, description, secondary_code, stock, classification, branch";

/// Contents of the `meta` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotMeta {
    pub format_version: u32,
    pub built_at: DateTime<Utc>,
    pub branches: Vec<String>,
    pub report: BuildReport,
}

/// Write `records` to `path`, replacing any previous snapshot atomically.
///
/// The table is written to a sibling temp file and renamed into place, so
/// readers see either the old snapshot or the new one, never a partial one.
pub fn write_snapshot(
    path: &Path,
    records: &[InventoryRecord],
    branches: &BranchSet,
    report: &BuildReport,
) -> Result<SnapshotMeta, IoError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| IoError::Replace {
            path: path.to_path_buf(),
            source,
        })?;
    }

    let tmp = temp_path(path);
    if tmp.exists() {
        fs::remove_file(&tmp).map_err(|source| IoError::Replace {
            path: tmp.clone(),
            source,
        })?;
    }

    let meta = SnapshotMeta {
        format_version: SNAPSHOT_FORMAT_VERSION,
        built_at: Utc::now(),
        branches: branches.as_slice().to_vec(),
        report: report.clone(),
    };

    if let Err(e) = write_tables(&tmp, records, branches, &meta) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }

    fs::rename(&tmp, path).map_err(|source| IoError::Replace {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("wrote {} record(s) to {}", records.len(), path.display());
    Ok(meta)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_tables(
    path: &Path,
    records: &[InventoryRecord],
    branches: &BranchSet,
    meta: &SnapshotMeta,
) -> Result<(), IoError> {
    let mut conn = Connection::open(path).map_err(IoError::snapshot(path))?;
    conn.execute_batch(SCHEMA).map_err(IoError::snapshot(path))?;

    let tx = conn.transaction().map_err(IoError::snapshot(path))?;
    {
        let mut stmt = tx
            .prepare(
                "INSERT INTO inventory (code, description, secondary_code, stock, classification, branch, branch_rank, \
                 norm_code, norm_description, norm_secondary_code, norm_classification, norm_branch) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            )
            .map_err(IoError::snapshot(path))?;

        for r in records {
            let doc = SearchDocument::from_record(r);
            stmt.execute(params![
                r.code,
                r.description,
                r.secondary_code,
                r.stock,
                r.classification.label(),
                r.branch,
                branches.rank(&r.branch) as i64,
                doc.code,
                doc.description,
                doc.secondary_code,
                doc.classification,
                doc.branch,
            ])
            .map_err(IoError::snapshot(path))?;
        }

        let report = serde_json::to_string(&meta.report).map_err(|e| IoError::BadSnapshot {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let entries = [
            ("format_version", meta.format_version.to_string()),
            ("built_at", meta.built_at.to_rfc3339()),
            ("branches", meta.branches.join(",")),
            ("report", report),
        ];
        let mut stmt = tx
            .prepare("INSERT INTO meta (key, value) VALUES (?1, ?2)")
            .map_err(IoError::snapshot(path))?;
        for (key, value) in entries {
            stmt.execute(params![key, value]).map_err(IoError::snapshot(path))?;
        }
    }
    tx.commit().map_err(IoError::snapshot(path))
}

/// Read the `meta` table of an existing snapshot.
pub fn read_meta(path: &Path) -> Result<SnapshotMeta, IoError> {
    let conn = open_read_only(path).map_err(IoError::snapshot(path))?;
    let bad = |message: String| IoError::BadSnapshot {
        path: path.to_path_buf(),
        message,
    };
    let get = |key: &str| -> Result<String, IoError> {
        conn.query_row("SELECT value FROM meta WHERE key = ?1", [key], |row| row.get(0))
            .map_err(|e| bad(format!("meta '{key}': {e}")))
    };

    let format_version: u32 = get("format_version")?
        .parse()
        .map_err(|_| bad("format_version is not a number".into()))?;
    if format_version != SNAPSHOT_FORMAT_VERSION {
        return Err(bad(format!(
            "format version {format_version}, expected {SNAPSHOT_FORMAT_VERSION}"
        )));
    }
    let built_at = DateTime::parse_from_rfc3339(&get("built_at")?)
        .map_err(|e| bad(format!("built_at: {e}")))?
        .with_timezone(&Utc);
    let branches = get("branches")?
        .split(',')
        .filter(|b| !b.is_empty())
        .map(str::to_string)
        .collect();
    let report = serde_json::from_str(&get("report")?).map_err(|e| bad(format!("report: {e}")))?;

    Ok(SnapshotMeta {
        format_version,
        built_at,
        branches,
        report,
    })
}

fn open_read_only(path: &Path) -> rusqlite::Result<Connection> {
    Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
}

/// `InventoryStore` over a snapshot file.
///
/// Holds only the path: every call opens a read-only connection, runs one
/// bounded query, and drops it, so a rebuild can rename a new file in at
/// any time.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

impl SqliteStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        let conn = open_read_only(&self.path).map_err(|e| StoreError::Open {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })?;
        let version: String = conn
            .query_row(
                "SELECT value FROM meta WHERE key = 'format_version'",
                [],
                |row| row.get(0),
            )
            .map_err(|e| StoreError::Schema(e.to_string()))?;
        if version != SNAPSHOT_FORMAT_VERSION.to_string() {
            return Err(StoreError::Schema(format!(
                "format version {version}, expected {SNAPSHOT_FORMAT_VERSION}"
            )));
        }
        Ok(conn)
    }
}

impl InventoryStore for SqliteStore {
    fn find_products(
        &self,
        predicate: &Predicate,
        sort: SortKey,
        limit: usize,
    ) -> Result<Vec<InventoryRecord>, StoreError> {
        let conn = self.connect()?;
        let (sql, args) = compile(predicate, sort, limit);
        log::debug!("search sql: {sql} {args:?}");

        let mut stmt = conn.prepare(&sql).map_err(query_err)?;
        let rows = stmt
            .query_map(params_from_iter(args), record_from_row)
            .map_err(query_err)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(query_err)
    }

    fn product(&self, code: &str) -> Result<Option<ProductRecords>, StoreError> {
        let conn = self.connect()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {RECORD_COLUMNS} FROM inventory WHERE code = ?1 ORDER BY branch_rank"
            ))
            .map_err(query_err)?;
        let records = stmt
            .query_map([code], record_from_row)
            .map_err(query_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(query_err)?;

        let (globals, branches): (Vec<_>, Vec<_>) =
            records.into_iter().partition(InventoryRecord::is_global);
        match globals.into_iter().next() {
            Some(global) => Ok(Some(ProductRecords { global, branches })),
            None if branches.is_empty() => Ok(None),
            None => Err(StoreError::Schema(format!("code {code} has no Global row"))),
        }
    }
}

fn query_err(e: rusqlite::Error) -> StoreError {
    StoreError::Query(e.to_string())
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<InventoryRecord> {
    let classification: String = row.get(4)?;
    Ok(InventoryRecord {
        code: row.get(0)?,
        description: row.get(1)?,
        secondary_code: row.get(2)?,
        stock: row.get(3)?,
        classification: Classification::parse(&classification),
        branch: row.get(5)?,
    })
}

/// Translate a predicate into one parameterized SELECT over Global rows.
///
/// Mirrors `Predicate::matches`: token clauses test the stored `norm_*`
/// columns, branch clauses become `EXISTS` over the product's branch rows.
fn compile(predicate: &Predicate, sort: SortKey, limit: usize) -> (String, Vec<Value>) {
    let mut args: Vec<Value> = vec![Value::Text(GLOBAL_BRANCH.to_string())];
    let mut conditions = vec!["g.branch = ?1".to_string()];

    for clause in predicate.clauses() {
        match clause {
            Clause::Token(token) => {
                args.push(Value::Text(token.clone()));
                let n = args.len();
                let fields = [
                    "norm_description",
                    "norm_code",
                    "norm_secondary_code",
                    "norm_classification",
                    "norm_branch",
                ]
                .iter()
                .map(|col| format!("instr(g.{col}, ?{n}) > 0"))
                .collect::<Vec<_>>()
                .join(" OR ");
                conditions.push(format!("({fields})"));
            }
            Clause::InStock(set) => {
                let within = branch_list(set, &mut args);
                conditions.push(format!(
                    "EXISTS (SELECT 1 FROM inventory b WHERE b.code = g.code AND b.branch <> ?1 AND b.stock > 0{within})"
                ));
            }
            Clause::PresentIn(set) if set.is_empty() => {}
            Clause::PresentIn(set) => {
                let within = branch_list(set, &mut args);
                conditions.push(format!(
                    "EXISTS (SELECT 1 FROM inventory b WHERE b.code = g.code AND b.branch <> ?1{within})"
                ));
            }
        }
    }

    let order = match sort {
        SortKey::Description => "g.norm_description, g.description, g.code",
        SortKey::StockAsc => "g.stock ASC, g.norm_description, g.description, g.code",
        SortKey::StockDesc => "g.stock DESC, g.norm_description, g.description, g.code",
    };
    args.push(Value::Integer(i64::try_from(limit).unwrap_or(i64::MAX)));
    let sql = format!(
        "SELECT g.{} FROM inventory g WHERE {} ORDER BY {order} LIMIT ?{}",
        RECORD_COLUMNS.replace(", ", ", g."),
        conditions.join(" AND "),
        args.len()
    );
    (sql, args)
}

/// ` AND b.branch IN (?n, ...)`, or nothing for an empty set.
fn branch_list(set: &[String], args: &mut Vec<Value>) -> String {
    if set.is_empty() {
        return String::new();
    }
    let placeholders: Vec<String> = set
        .iter()
        .map(|b| {
            args.push(Value::Text(b.clone()));
            format!("?{}", args.len())
        })
        .collect();
    format!(" AND b.branch IN ({})", placeholders.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn rec(code: &str, desc: &str, stock: i64, class: &str, branch: &str) -> InventoryRecord {
        InventoryRecord {
            code: code.into(),
            description: desc.into(),
            secondary_code: None,
            stock,
            classification: Classification::parse(class),
            branch: branch.into(),
        }
    }

    fn records() -> Vec<InventoryRecord> {
        vec![
            rec("001", "Martillo", 5, "A", "HI"),
            rec("001", "Martillo", 3, "A", "EX"),
            rec("001", "Martillo", 8, "A", GLOBAL_BRANCH),
        ]
    }

    #[test]
    fn compiled_sql_binds_every_value() {
        let p = Predicate::for_search(&["tin".into(), "aco".into()], &["HI".into(), "EX".into()], true);
        let (sql, args) = compile(&p, SortKey::StockDesc, 100);
        assert!(sql.contains("instr(g.norm_description, ?2) > 0"));
        assert!(sql.contains("instr(g.norm_branch, ?3) > 0"));
        assert!(sql.contains("b.stock > 0 AND b.branch IN (?4, ?5)"));
        assert!(sql.contains("b.branch IN (?6, ?7)"));
        assert!(sql.ends_with("ORDER BY g.stock DESC, g.norm_description, g.description, g.code LIMIT ?8"));
        assert!(sql.starts_with("SELECT g.code, g.description, g.secondary_code"));
        assert_eq!(args.len(), 8);
        assert_eq!(args[7], Value::Integer(100));
    }

    #[test]
    fn write_then_read_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("inventario.db");
        let report = BuildReport {
            products: 1,
            records: 3,
            ..Default::default()
        };
        write_snapshot(&path, &records(), &BranchSet::default(), &report).unwrap();
        assert!(!temp_path(&path).exists());

        let meta = read_meta(&path).unwrap();
        assert_eq!(meta.format_version, SNAPSHOT_FORMAT_VERSION);
        assert_eq!(meta.branches, vec!["HI", "EX", "MT", "SA", "ADE"]);
        assert_eq!(meta.report, report);

        let store = SqliteStore::new(&path);
        let product = store.product("001").unwrap().unwrap();
        assert_eq!(product.global.stock, 8);
        let names: Vec<&str> = product.branches.iter().map(|r| r.branch.as_str()).collect();
        assert_eq!(names, vec!["HI", "EX"]);
        assert_eq!(store.product("999").unwrap(), None);
    }

    #[test]
    fn rewrite_replaces_previous_snapshot() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("inventario.db");
        let branches = BranchSet::default();
        write_snapshot(&path, &records(), &branches, &BuildReport::default()).unwrap();
        write_snapshot(
            &path,
            &[rec("002", "Pinzas", 1, "C", "SA"), rec("002", "Pinzas", 1, "C", GLOBAL_BRANCH)],
            &branches,
            &BuildReport::default(),
        )
        .unwrap();

        let store = SqliteStore::new(&path);
        assert_eq!(store.product("001").unwrap(), None);
        assert!(store.product("002").unwrap().is_some());
    }

    #[test]
    fn missing_snapshot_is_open_error() {
        let dir = TempDir::new().unwrap();
        let store = SqliteStore::new(dir.path().join("nope.db"));
        let err = store.find_products(&Predicate::new(), SortKey::Description, 10).unwrap_err();
        assert!(matches!(err, StoreError::Open { .. }));
        assert!(!dir.path().join("nope.db").exists());
    }

    #[test]
    fn foreign_database_is_schema_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("other.db");
        Connection::open(&path)
            .unwrap()
            .execute_batch("CREATE TABLE t (x INTEGER);")
            .unwrap();
        let err = SqliteStore::new(&path).product("001").unwrap_err();
        assert!(matches!(err, StoreError::Schema(_)));
        assert!(matches!(read_meta(&path), Err(IoError::BadSnapshot { .. })));
    }
}
