use stockscope_core::{Classification, InventoryRecord};

use crate::ingest::load::RawRow;

/// A cleaned record plus what the cleaner had to paper over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanRow {
    pub record: InventoryRecord,
    /// Stock was unparseable and replaced with 0.
    pub stock_defaulted: bool,
    /// The source row carried a classification tag. Blank tags are stored
    /// as "Sin Mov" but lose to any explicit tag during aggregation.
    pub classified: bool,
}

impl From<InventoryRecord> for CleanRow {
    fn from(record: InventoryRecord) -> Self {
        Self {
            record,
            stock_defaulted: false,
            classified: true,
        }
    }
}

/// Normalize one raw row for `branch`. Rows without a code are discarded.
pub fn clean_row(raw: &RawRow, branch: &str) -> Option<CleanRow> {
    let code = raw.code.trim();
    if code.is_empty() {
        return None;
    }

    let (stock, stock_defaulted) = match parse_stock(&raw.stock) {
        Some(n) => (n, false),
        None => {
            log::warn!(
                "branch {branch}, row {}, code {code}: unreadable stock {:?}, using 0",
                raw.line,
                raw.stock
            );
            (0, true)
        }
    };

    let secondary_code = raw
        .secondary_code
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    Some(CleanRow {
        record: InventoryRecord {
            code: code.to_string(),
            description: raw.description.trim().to_string(),
            secondary_code,
            stock,
            classification: Classification::parse(&raw.classification),
            branch: branch.to_string(),
        },
        stock_defaulted,
        classified: !raw.classification.trim().is_empty(),
    })
}

/// Strip everything but digits, sign and decimal point, then parse.
///
/// Blank input is a legitimate 0. `None` means the text had content but no
/// number survived. Fractions round half away from zero.
pub fn parse_stock(raw: &str) -> Option<i64> {
    if raw.trim().is_empty() {
        return Some(0);
    }

    let kept: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.'))
        .collect();

    let value: f64 = kept.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    // `as` saturates at the i64 bounds.
    Some(value.round() as i64)
}
