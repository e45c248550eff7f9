// Human-readable and JSON output for each command

use std::io::{self, Write};

use serde::Serialize;
use stockscope_core::{MovementStatus, StockLevel};
use stockscope_engine::{BuildReport, ProductDetail, SearchHit, SearchResults};
use stockscope_io::SnapshotMeta;

/// Write exactly one JSON value to stdout.
pub fn json<T: Serialize>(value: &T) -> io::Result<()> {
    let text = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
    let mut out = io::stdout().lock();
    writeln!(out, "{text}")
}

#[derive(Serialize)]
struct HitView<'a> {
    #[serde(flatten)]
    hit: &'a SearchHit,
    #[serde(skip_serializing_if = "Option::is_none")]
    highlighted: Option<String>,
}

#[derive(Serialize)]
struct SearchView<'a> {
    query: &'a str,
    hits: Vec<HitView<'a>>,
    truncated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    issue: Option<&'a stockscope_engine::SearchIssue>,
}

pub fn search_json(results: &SearchResults, with_highlight: bool) -> io::Result<()> {
    let hits = results
        .hits
        .iter()
        .map(|hit| HitView {
            hit,
            highlighted: with_highlight
                .then(|| hit.highlighted_description(&results.query).into_text()),
        })
        .collect();
    json(&SearchView {
        query: &results.query,
        hits,
        truncated: results.truncated,
        issue: results.issue.as_ref(),
    })
}

pub fn search_text(results: &SearchResults, with_highlight: bool, limit: usize) {
    if results.hits.is_empty() {
        println!("no products match \"{}\"", results.query);
        return;
    }

    let code_w = column_width(results.hits.iter().map(|h| h.code.as_str()), "CODE");
    println!("{:<code_w$}  {:<40}  {:>8}  {:<8}  STATUS", "CODE", "DESCRIPTION", "STOCK", "CLASS");
    for hit in &results.hits {
        let description = if with_highlight {
            hit.highlighted_description(&results.query).into_text()
        } else {
            hit.description.clone()
        };
        println!(
            "{:<code_w$}  {:<40}  {:>8}  {:<8}  {}",
            hit.code,
            description,
            hit.stock,
            hit.classification.label(),
            status_note(hit.level, Some(hit.status)),
        );
    }

    let mut footer = format!("{} product(s) for \"{}\"", results.hits.len(), results.query);
    if results.truncated {
        footer.push_str(&format!(" (first {limit} shown, refine the query)"));
    }
    println!("{footer}");
}

pub fn detail_text(detail: &ProductDetail) {
    print!("{}  {}", detail.code, detail.description);
    if let Some(aux) = &detail.secondary_code {
        print!("  [{aux}]");
    }
    println!();
    println!(
        "total {}  class {}  {}",
        detail.total,
        detail.classification.label(),
        status_note(detail.level, Some(detail.status))
    );
    println!();

    println!("{:<8}  {:>8}  {:<8}  STATUS", "BRANCH", "STOCK", "CLASS");
    for b in &detail.branches {
        let status = if b.present {
            status_note(b.level, b.status)
        } else {
            "not carried".to_string()
        };
        println!(
            "{:<8}  {:>8}  {:<8}  {}",
            b.branch,
            b.stock,
            b.classification_label(),
            status
        );
    }
}

pub fn build_text(report: &BuildReport, database: &str) {
    for b in &report.branches {
        let mut line = format!("  {:<6} {:>6} row(s)  {}", b.branch, b.rows_read, b.origin);
        if b.rows_discarded > 0 {
            line.push_str(&format!("  [{} without code]", b.rows_discarded));
        }
        if b.stock_defaulted > 0 {
            line.push_str(&format!("  [{} unreadable stock]", b.stock_defaulted));
        }
        println!("{line}");
    }
    for s in &report.skipped {
        println!("  {:<6} skipped  {}: {}", s.branch, s.origin, s.reason);
    }
    println!("{} -> {}", report.summary(), database);
}

pub fn info_text(meta: &SnapshotMeta, database: &str) {
    println!("snapshot   {database}");
    println!("built      {}", meta.built_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("format     v{}", meta.format_version);
    println!("branches   {}", meta.branches.join(", "));
    println!("products   {}", meta.report.products);
    println!("records    {}", meta.report.records);
    if !meta.report.skipped.is_empty() {
        println!("skipped    {}", meta.report.skipped.len());
        for s in &meta.report.skipped {
            println!("  {}: {}", s.origin, s.reason);
        }
    }
}

fn status_note(level: StockLevel, status: Option<MovementStatus>) -> String {
    let mut notes = Vec::new();
    if level == StockLevel::Negative {
        notes.push("NEGATIVE STOCK");
    }
    match status {
        Some(MovementStatus::LowMovement) => notes.push("low movement"),
        Some(MovementStatus::Stagnant) => notes.push("no movement, holding stock"),
        _ => {}
    }
    notes.join(", ")
}

fn column_width<'a>(values: impl Iterator<Item = &'a str>, header: &str) -> usize {
    values
        .map(|v| v.chars().count())
        .max()
        .unwrap_or(0)
        .max(header.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_notes() {
        assert_eq!(status_note(StockLevel::Negative, Some(MovementStatus::Neutral)), "NEGATIVE STOCK");
        assert_eq!(
            status_note(StockLevel::Available, Some(MovementStatus::Stagnant)),
            "no movement, holding stock"
        );
        assert_eq!(status_note(StockLevel::Available, Some(MovementStatus::Active)), "");
        assert_eq!(
            status_note(StockLevel::Negative, Some(MovementStatus::LowMovement)),
            "NEGATIVE STOCK, low movement"
        );
    }

    #[test]
    fn code_column_fits_header() {
        assert_eq!(column_width(["1", "22"].into_iter(), "CODE"), 4);
        assert_eq!(column_width(["ABCDEFG"].into_iter(), "CODE"), 7);
    }
}
