use serde::{Deserialize, Serialize};

use crate::branch::GLOBAL_BRANCH;

/// Label stored when a row carries no classification.
pub const NO_MOVEMENT_LABEL: &str = "Sin Mov";

/// Movement classification of a product at one branch.
///
/// A/B/C grade how recently the product sold (A: 6-12 months with sales,
/// B: 3-5, C: 1-2). `NoMovement` is the "Sin Mov" tag. Anything else found
/// in a source sheet is kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Classification {
    A,
    B,
    C,
    NoMovement,
    Other(String),
}

impl Classification {
    /// Parse a raw tag. Blank input maps to `NoMovement`.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::NoMovement;
        }
        match trimmed.to_ascii_uppercase().as_str() {
            "A" => Self::A,
            "B" => Self::B,
            "C" => Self::C,
            "SIN MOV" | "SIN MOVIMIENTO" | "S/M" | "SM" => Self::NoMovement,
            _ => Self::Other(trimmed.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::NoMovement => NO_MOVEMENT_LABEL,
            Self::Other(s) => s,
        }
    }
}

impl Default for Classification {
    fn default() -> Self {
        Self::NoMovement
    }
}

impl From<String> for Classification {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<Classification> for String {
    fn from(c: Classification) -> Self {
        c.label().to_string()
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One row per (product, branch) after cleaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub code: String,
    pub description: String,
    pub secondary_code: Option<String>,
    /// Signed: negative means over-committed stock.
    pub stock: i64,
    pub classification: Classification,
    pub branch: String,
}

impl InventoryRecord {
    pub fn is_global(&self) -> bool {
        self.branch == GLOBAL_BRANCH
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_tags() {
        assert_eq!(Classification::parse("a"), Classification::A);
        assert_eq!(Classification::parse(" B "), Classification::B);
        assert_eq!(Classification::parse("C"), Classification::C);
        assert_eq!(Classification::parse("Sin Mov"), Classification::NoMovement);
        assert_eq!(Classification::parse("SIN MOV"), Classification::NoMovement);
    }

    #[test]
    fn blank_defaults_to_no_movement() {
        assert_eq!(Classification::parse(""), Classification::NoMovement);
        assert_eq!(Classification::parse("   "), Classification::NoMovement);
        assert_eq!(Classification::default().label(), "Sin Mov");
    }

    #[test]
    fn unknown_tag_preserved() {
        let c = Classification::parse("D*");
        assert_eq!(c, Classification::Other("D*".into()));
        assert_eq!(c.to_string(), "D*");
    }

    #[test]
    fn serializes_as_label() {
        let json = serde_json::to_string(&Classification::NoMovement).unwrap();
        assert_eq!(json, "\"Sin Mov\"");
        let back: Classification = serde_json::from_str("\"c\"").unwrap();
        assert_eq!(back, Classification::C);
    }
}
