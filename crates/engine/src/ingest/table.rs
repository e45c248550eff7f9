/// A branch table exactly as read from disk: every row, header rows
/// included, every cell already rendered to text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    /// Human-readable origin, e.g. `book.xlsx#Class(HI)`. Used in warnings.
    pub name: String,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|r| r.iter().all(|c| c.trim().is_empty()))
    }

    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Cell text, empty when the row is short.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }
}
