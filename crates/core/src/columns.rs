//! Mapping from logical inventory fields to source columns.
//!
//! A rule is either a fixed zero-based position or a list of header aliases.
//! Aliases match case-insensitively as substrings of the header text, so
//! `"inv"` finds both `Inv` and `Inventario Final`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Code,
    Description,
    Stock,
    Classification,
    SecondaryCode,
}

impl Field {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Description => "description",
            Self::Stock => "stock",
            Self::Classification => "classification",
            Self::SecondaryCode => "secondary_code",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnRule {
    Position(usize),
    Aliases(Vec<String>),
}

impl ColumnRule {
    fn aliases(names: &[&str]) -> Self {
        Self::Aliases(names.iter().map(|s| s.to_string()).collect())
    }

    pub fn is_positional(&self) -> bool {
        matches!(self, Self::Position(_))
    }

    /// Resolve against a header row. Returns the column index.
    ///
    /// Aliases are tried in order; for each alias the leftmost header that
    /// contains it wins.
    pub fn resolve(&self, headers: &[String]) -> Option<usize> {
        match self {
            Self::Position(idx) => (*idx < headers.len()).then_some(*idx),
            Self::Aliases(aliases) => {
                let lowered: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
                aliases.iter().find_map(|alias| {
                    let alias = alias.trim().to_lowercase();
                    if alias.is_empty() {
                        return None;
                    }
                    lowered.iter().position(|h| h.contains(&alias))
                })
            }
        }
    }
}

/// One rule per field. `secondary_code` is optional: a sheet without it is
/// still readable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnRules {
    pub code: ColumnRule,
    pub description: ColumnRule,
    pub stock: ColumnRule,
    pub classification: ColumnRule,
    pub secondary_code: Option<ColumnRule>,
}

impl Default for ColumnRules {
    fn default() -> Self {
        Self {
            code: ColumnRule::aliases(&["cve_prod", "codigo", "clave", "articulo", "sku"]),
            description: ColumnRule::aliases(&["desc_prod", "descripcion", "producto", "nombre", "desc"]),
            stock: ColumnRule::aliases(&["inv", "existencia", "exist", "stock"]),
            classification: ColumnRule::aliases(&["clasificacion", "clasificación", "clase"]),
            secondary_code: Some(ColumnRule::aliases(&["descprod2", "codigo2", "aux"])),
        }
    }
}

impl ColumnRules {
    pub fn required(&self) -> [(Field, &ColumnRule); 4] {
        [
            (Field::Code, &self.code),
            (Field::Description, &self.description),
            (Field::Stock, &self.stock),
            (Field::Classification, &self.classification),
        ]
    }

    /// True when no rule needs a header row to resolve.
    pub fn all_positional(&self) -> bool {
        self.required().iter().all(|(_, r)| r.is_positional())
            && self.secondary_code.as_ref().map_or(true, ColumnRule::is_positional)
    }
}
