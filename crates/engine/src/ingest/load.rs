use stockscope_core::{ColumnRule, ColumnRules, Field};

use crate::error::IngestError;
use crate::ingest::table::RawTable;

/// How many leading rows are searched for a header when none is configured.
pub const HEADER_SCAN_ROWS: usize = 20;

/// One data row with its fields picked out but not yet cleaned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based row number in the source table, for warnings.
    pub line: usize,
    pub code: String,
    pub description: String,
    pub secondary_code: Option<String>,
    pub stock: String,
    pub classification: String,
}

#[derive(Debug, Clone, Copy)]
struct ColumnMap {
    code: usize,
    description: usize,
    stock: usize,
    classification: usize,
    secondary_code: Option<usize>,
}

/// Slice one branch table into raw rows.
///
/// `header_row` pins the (zero-based) header row. Without it, a fully
/// positional rule set reads from row 0 with no header, and any alias rule
/// triggers a scan of the first `HEADER_SCAN_ROWS` rows for the first row on
/// which every required column resolves.
///
/// Missing required columns make the whole branch unreadable; the caller
/// decides whether that is fatal.
pub fn load_branch(
    table: &RawTable,
    rules: &ColumnRules,
    header_row: Option<usize>,
) -> Result<Vec<RawRow>, IngestError> {
    if table.is_empty() {
        return Err(IngestError::EmptyTable {
            table: table.name.clone(),
        });
    }

    let (map, data_start) = match header_row {
        Some(idx) => {
            let headers = header_cells(table, idx);
            (resolve(table, rules, &headers)?, idx + 1)
        }
        None if rules.all_positional() => {
            let widest: Vec<String> = (0..table.width()).map(|i| i.to_string()).collect();
            (resolve(table, rules, &widest)?, 0)
        }
        None => locate_header(table, rules)?,
    };

    let mut rows = Vec::new();
    for (offset, cells) in table.rows.iter().enumerate().skip(data_start) {
        if cells.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        let get = |col: usize| table.cell(offset, col).to_string();
        rows.push(RawRow {
            line: offset + 1,
            code: get(map.code),
            description: get(map.description),
            secondary_code: map.secondary_code.map(|col| get(col)),
            stock: get(map.stock),
            classification: get(map.classification),
        });
    }

    Ok(rows)
}

fn header_cells(table: &RawTable, row: usize) -> Vec<String> {
    table.rows.get(row).cloned().unwrap_or_default()
}

fn locate_header(table: &RawTable, rules: &ColumnRules) -> Result<(ColumnMap, usize), IngestError> {
    let scan = table.rows.len().min(HEADER_SCAN_ROWS);
    for idx in 0..scan {
        let headers = header_cells(table, idx);
        if let Ok(map) = resolve(table, rules, &headers) {
            return Ok((map, idx + 1));
        }
    }
    // Report against the first non-blank row: the most likely header.
    let first = table
        .rows
        .iter()
        .position(|r| r.iter().any(|c| !c.trim().is_empty()))
        .unwrap_or(0);
    resolve(table, rules, &header_cells(table, first)).map(|map| (map, first + 1))
}

fn resolve(table: &RawTable, rules: &ColumnRules, headers: &[String]) -> Result<ColumnMap, IngestError> {
    let mut missing = Vec::new();
    let mut find = |field: Field, rule: &ColumnRule| {
        let found = rule.resolve(headers);
        if found.is_none() {
            missing.push(field);
        }
        found.unwrap_or(0)
    };

    let code = find(Field::Code, &rules.code);
    let description = find(Field::Description, &rules.description);
    let stock = find(Field::Stock, &rules.stock);
    let classification = find(Field::Classification, &rules.classification);

    if !missing.is_empty() {
        return Err(IngestError::MissingColumns {
            table: table.name.clone(),
            missing,
            available: headers
                .iter()
                .map(|h| h.trim().to_string())
                .filter(|h| !h.is_empty())
                .collect(),
        });
    }

    let required = [
        (Field::Code, code),
        (Field::Description, description),
        (Field::Stock, stock),
        (Field::Classification, classification),
    ];
    for (i, &(first, col)) in required.iter().enumerate() {
        if let Some(&(second, _)) = required[i + 1..].iter().find(|(_, other)| *other == col) {
            return Err(IngestError::SharedColumn {
                table: table.name.clone(),
                header: headers.get(col).map(|h| h.trim().to_string()).unwrap_or_default(),
                first,
                second,
            });
        }
    }

    Ok(ColumnMap {
        code,
        description,
        stock,
        classification,
        secondary_code: rules.secondary_code.as_ref().and_then(|r| r.resolve(headers)),
    })
}
