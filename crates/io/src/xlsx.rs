// Excel workbooks: one sheet per branch

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use stockscope_engine::RawTable;

use crate::error::IoError;

/// One branch sheet found in a workbook.
#[derive(Debug)]
pub struct BranchSheet {
    pub sheet: String,
    /// Branch code derived from the sheet name.
    pub branch: String,
    pub table: Result<RawTable, IoError>,
}

/// Branch code for a sheet name: the prefix is stripped (case-insensitive)
/// along with parentheses and separators. `Class(HI)` → `HI`.
pub fn branch_from_sheet(sheet: &str, prefix: &str) -> Option<String> {
    let name = sheet.trim();
    let head = name.get(..prefix.len())?;
    if !head.eq_ignore_ascii_case(prefix) {
        return None;
    }
    let code: String = name[prefix.len()..]
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, '(' | ')' | '_' | '-' | '.'))
        .to_string();
    (!code.is_empty()).then_some(code)
}

/// Every sheet whose name starts with `prefix`, in workbook order.
///
/// A sheet that fails to read is returned with an `Err` table so the
/// caller can skip just that branch.
pub fn read_branch_sheets(path: &Path, prefix: &str) -> Result<Vec<BranchSheet>, IoError> {
    let mut workbook = open(path)?;
    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();

    let found: Vec<BranchSheet> = sheet_names
        .iter()
        .filter_map(|sheet| {
            let branch = branch_from_sheet(sheet, prefix)?;
            Some(BranchSheet {
                sheet: sheet.clone(),
                branch,
                table: read_range(&mut workbook, path, sheet),
            })
        })
        .collect();

    if found.is_empty() {
        return Err(IoError::NoBranchSheets {
            path: path.to_path_buf(),
            prefix: prefix.to_string(),
        });
    }
    Ok(found)
}

/// Read one named sheet.
pub fn read_sheet(path: &Path, sheet: &str) -> Result<RawTable, IoError> {
    let mut workbook = open(path)?;
    let exists = workbook.sheet_names().iter().any(|s| s == sheet);
    if !exists {
        return Err(IoError::MissingSheet {
            path: path.to_path_buf(),
            sheet: sheet.to_string(),
        });
    }
    read_range(&mut workbook, path, sheet)
}

fn open(path: &Path) -> Result<Sheets<std::io::BufReader<std::fs::File>>, IoError> {
    open_workbook_auto(path).map_err(|e| IoError::Workbook {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn read_range(
    workbook: &mut Sheets<std::io::BufReader<std::fs::File>>,
    path: &Path,
    sheet: &str,
) -> Result<RawTable, IoError> {
    let range = workbook.worksheet_range(sheet).map_err(|e| IoError::Workbook {
        path: path.to_path_buf(),
        message: format!("sheet '{sheet}': {e}"),
    })?;

    // Keep sheet coordinates: a pinned header row counts from row 1 of the sheet
    let (start_row, start_col) = range.start().unwrap_or((0, 0));
    let mut rows: Vec<Vec<String>> = vec![Vec::new(); start_row as usize];
    for row in range.rows() {
        let mut cells = vec![String::new(); start_col as usize];
        cells.extend(row.iter().map(cell_text));
        while cells.last().is_some_and(|c| c.is_empty()) {
            cells.pop();
        }
        rows.push(cells);
    }

    Ok(RawTable::new(format!("{}#{sheet}", path.display()), rows))
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(n) => {
            // Format nicely: integers without decimals
            if n.fract() == 0.0 && n.abs() < 1e15 {
                format!("{}", *n as i64)
            } else {
                format!("{}", n)
            }
        }
        Data::Int(n) => n.to_string(),
        Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Data::Error(e) => format!("#{:?}", e),
        Data::DateTime(dt) => format!("{}", dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
    }
}
