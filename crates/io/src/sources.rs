//! Resolve configured sources into per-branch builder inputs.

use std::path::Path;

use stockscope_config::{Settings, SourceConfig};
use stockscope_core::BranchSet;
use stockscope_engine::BranchInput;

use crate::{csv, xlsx};

const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];

pub fn is_workbook(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| WORKBOOK_EXTENSIONS.iter().any(|w| w.eq_ignore_ascii_case(e)))
}

/// Read every configured source.
///
/// Never fails: an unreadable file or sheet becomes a `BranchInput` with an
/// `Err` table, which the builder skips with a warning. The result is in
/// branch priority order (stable within a branch), unknown branches last.
pub fn collect_inputs(settings: &Settings) -> Vec<BranchInput> {
    let mut inputs = Vec::new();
    for source in &settings.ingest.sources {
        let header_row = settings.header_row_for(source);
        if is_workbook(&source.path) {
            workbook_inputs(source, &settings.ingest.sheet_prefix, header_row, &mut inputs);
        } else {
            inputs.push(csv_input(source, header_row));
        }
    }
    sort_by_priority(&mut inputs, &settings.branches);
    inputs
}

fn csv_input(source: &SourceConfig, header_row: Option<usize>) -> BranchInput {
    // Without an explicit branch, "ex.csv" feeds branch EX
    let branch = source.branch.clone().unwrap_or_else(|| {
        source
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    });
    BranchInput {
        branch,
        origin: source.path.display().to_string(),
        header_row,
        table: csv::read_table(&source.path).map_err(|e| e.to_string()),
    }
}

fn workbook_inputs(
    source: &SourceConfig,
    prefix: &str,
    header_row: Option<usize>,
    out: &mut Vec<BranchInput>,
) {
    let origin = source.path.display().to_string();

    if let Some(sheet) = &source.sheet {
        out.push(BranchInput {
            branch: source.branch.clone().unwrap_or_default(),
            origin: format!("{origin}#{sheet}"),
            header_row,
            table: xlsx::read_sheet(&source.path, sheet).map_err(|e| e.to_string()),
        });
        return;
    }

    match xlsx::read_branch_sheets(&source.path, prefix) {
        Ok(sheets) => {
            for found in sheets {
                if let Some(only) = &source.branch {
                    if !found.branch.eq_ignore_ascii_case(only) {
                        continue;
                    }
                }
                out.push(BranchInput {
                    branch: found.branch,
                    origin: format!("{origin}#{}", found.sheet),
                    header_row,
                    table: found.table.map_err(|e| e.to_string()),
                });
            }
        }
        Err(e) => out.push(BranchInput {
            branch: source.branch.clone().unwrap_or_else(|| "*".to_string()),
            origin,
            header_row,
            table: Err(e.to_string()),
        }),
    }
}

fn sort_by_priority(inputs: &mut [BranchInput], branches: &BranchSet) {
    inputs.sort_by_key(|i| {
        branches
            .resolve(&i.branch)
            .map(|b| branches.rank(b))
            .unwrap_or(branches.len())
    });
}
