use serde::{Deserialize, Serialize};
use stockscope_core::{BranchSet, ColumnRules, InventoryRecord};

use crate::error::IngestError;
use crate::ingest::aggregate::aggregate;
use crate::ingest::clean::{clean_row, CleanRow};
use crate::ingest::load::load_branch;
use crate::ingest::table::RawTable;

/// One branch's input as handed over by the reader.
///
/// `table` is the reader's verdict: an `Err` means the file or sheet could
/// not be read at all, and the branch will be skipped.
#[derive(Debug, Clone)]
pub struct BranchInput {
    pub branch: String,
    pub origin: String,
    pub header_row: Option<usize>,
    pub table: Result<RawTable, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchReport {
    pub branch: String,
    pub origin: String,
    pub rows_read: usize,
    /// Rows without a product code.
    pub rows_discarded: usize,
    /// Rows whose stock could not be parsed and was set to 0.
    pub stock_defaulted: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedBranch {
    pub branch: String,
    pub origin: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildReport {
    pub branches: Vec<BranchReport>,
    pub skipped: Vec<SkippedBranch>,
    /// Distinct product codes (= Global rows).
    pub products: usize,
    /// Rows in the final table, Global rows included.
    pub records: usize,
}

impl BuildReport {
    pub fn rows_read(&self) -> usize {
        self.branches.iter().map(|b| b.rows_read).sum()
    }

    pub fn has_warnings(&self) -> bool {
        !self.skipped.is_empty()
            || self
                .branches
                .iter()
                .any(|b| b.rows_discarded > 0 || b.stock_defaulted > 0)
    }

    pub fn summary(&self) -> String {
        format!(
            "{} branch(es) read, {} skipped, {} rows, {} products, {} records",
            self.branches.len(),
            self.skipped.len(),
            self.rows_read(),
            self.products,
            self.records
        )
    }
}

#[derive(Debug, Clone)]
pub struct BuildOutput {
    /// Aggregated table: per-branch rows plus one Global row per code.
    pub records: Vec<InventoryRecord>,
    pub report: BuildReport,
}

/// Run the whole builder over every branch input.
///
/// Branches are processed in the order given; callers pass them in branch
/// priority order so "first encountered" is deterministic. Unknown branch
/// names, unreadable tables and tables missing required columns are skipped
/// with a warning. Zero readable branches, or zero usable rows, is fatal.
pub fn build(
    inputs: Vec<BranchInput>,
    rules: &ColumnRules,
    branches: &BranchSet,
) -> Result<BuildOutput, IngestError> {
    let mut report = BuildReport::default();
    let mut cleaned: Vec<CleanRow> = Vec::new();

    for input in inputs {
        let table = match input.table {
            Ok(ref t) => t,
            Err(ref e) => {
                skip(&mut report, &input, e.clone());
                continue;
            }
        };

        let Some(branch) = branches.resolve(&input.branch) else {
            skip(&mut report, &input, format!("'{}' is not a configured branch", input.branch));
            continue;
        };

        let rows = match load_branch(table, rules, input.header_row) {
            Ok(rows) => rows,
            Err(e) => {
                skip(&mut report, &input, e.to_string());
                continue;
            }
        };

        let mut branch_report = BranchReport {
            branch: branch.to_string(),
            origin: input.origin.clone(),
            rows_read: rows.len(),
            ..Default::default()
        };
        for raw in &rows {
            match clean_row(raw, branch) {
                Some(row) => {
                    if row.stock_defaulted {
                        branch_report.stock_defaulted += 1;
                    }
                    cleaned.push(row);
                }
                None => branch_report.rows_discarded += 1,
            }
        }
        if branch_report.rows_discarded > 0 {
            log::warn!(
                "{}: discarded {} row(s) without a product code",
                input.origin,
                branch_report.rows_discarded
            );
        }
        log::info!("{}: read {} row(s) for branch {branch}", input.origin, branch_report.rows_read);
        report.branches.push(branch_report);
    }

    if report.branches.is_empty() {
        return Err(IngestError::NoBranchesRead {
            skipped: report.skipped,
        });
    }
    if cleaned.is_empty() {
        return Err(IngestError::NoRecords);
    }

    let records = aggregate(cleaned, branches);
    report.products = records.iter().filter(|r| r.is_global()).count();
    report.records = records.len();
    log::info!("build complete: {}", report.summary());

    Ok(BuildOutput { records, report })
}

fn skip(report: &mut BuildReport, input: &BranchInput, reason: String) {
    log::warn!("skipping {} (branch {}): {reason}", input.origin, input.branch);
    report.skipped.push(SkippedBranch {
        branch: input.branch.clone(),
        origin: input.origin.clone(),
        reason,
    });
}
