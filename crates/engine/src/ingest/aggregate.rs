use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use stockscope_core::{BranchSet, InventoryRecord, GLOBAL_BRANCH};

use crate::ingest::clean::CleanRow;

/// Group rows by (code, branch), sum stock, then derive one Global row per
/// code.
///
/// Within a (code, branch) group the first non-empty description, secondary
/// code and classification win; "first" means input order. A row whose tag
/// was blank never overrides a later explicit tag, so "Sin Mov" is only the
/// fallback when every row was blank. The Global row takes its text fields
/// the same way across the product's branches in `branches` priority order.
///
/// Output is sorted by code, then branch priority, Global last. Rows for
/// branches outside `branches` are dropped.
pub fn aggregate(rows: Vec<CleanRow>, branches: &BranchSet) -> Vec<InventoryRecord> {
    let mut groups: BTreeMap<(String, usize), CleanRow> = BTreeMap::new();

    for row in rows {
        let Some(branch) = branches.resolve(&row.record.branch) else {
            log::warn!(
                "code {}: dropping row for unknown branch '{}'",
                row.record.code,
                row.record.branch
            );
            continue;
        };
        let key = (row.record.code.clone(), branches.rank(branch));
        match groups.entry(key) {
            Entry::Occupied(mut entry) => merge_into(entry.get_mut(), row),
            Entry::Vacant(slot) => {
                let mut row = row;
                row.record.branch = branch.to_string();
                slot.insert(row);
            }
        }
    }

    let mut out: Vec<InventoryRecord> = Vec::with_capacity(groups.len() + groups.len() / 2);
    let mut global: Option<CleanRow> = None;

    for ((code, _), row) in groups {
        match global {
            Some(ref mut g) if g.record.code == code => merge_into(g, row.clone()),
            _ => {
                if let Some(done) = global.take() {
                    out.push(done.record);
                }
                let mut first = row.clone();
                first.record.branch = GLOBAL_BRANCH.to_string();
                global = Some(first);
            }
        }
        out.push(row.record);
    }
    if let Some(done) = global {
        out.push(done.record);
    }

    out
}

fn merge_into(entry: &mut CleanRow, other: CleanRow) {
    let target = &mut entry.record;
    target.stock = target.stock.saturating_add(other.record.stock);
    if target.description.is_empty() && !other.record.description.is_empty() {
        target.description = other.record.description;
    }
    if target.secondary_code.is_none() {
        target.secondary_code = other.record.secondary_code;
    }
    if !entry.classified && other.classified {
        target.classification = other.record.classification;
        entry.classified = true;
    }
}
