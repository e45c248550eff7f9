// Application settings
// Loaded from ~/.config/stockscope/stockscope.toml

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use stockscope_core::{BranchSet, ColumnRules, DEFAULT_MIN_QUERY_LEN, DEFAULT_RESULT_LIMIT, GLOBAL_BRANCH};

use crate::error::ConfigError;

/// Environment variable naming an alternative config file.
pub const CONFIG_ENV: &str = "SSCOPE_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// SQLite snapshot produced by `build` and read by `search`/`detail`.
    pub database: PathBuf,

    /// Real branches in display priority order.
    pub branches: BranchSet,

    pub search: SearchSettings,

    pub ingest: IngestSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: PathBuf::from("inventario.db"),
            branches: BranchSet::default(),
            search: SearchSettings::default(),
            ingest: IngestSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchSettings {
    /// Result cap per search.
    pub limit: usize,
    /// Queries shorter than this (in characters, trimmed) are rejected.
    pub min_query_len: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            limit: DEFAULT_RESULT_LIMIT,
            min_query_len: DEFAULT_MIN_QUERY_LEN,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IngestSettings {
    /// Workbook sheets whose name starts with this (case-insensitive) are
    /// treated as branch sheets.
    pub sheet_prefix: String,

    /// Zero-based header row for every source. `None` = auto-detect.
    pub header_row: Option<usize>,

    pub columns: ColumnRules,

    pub sources: Vec<SourceConfig>,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            sheet_prefix: "class".to_string(),
            header_row: None,
            columns: ColumnRules::default(),
            sources: Vec::new(),
        }
    }
}

/// One raw input: a CSV bound to a branch, or a workbook.
///
/// For workbooks, `sheet` + `branch` pins a single sheet; leaving both out
/// expands to every sheet matching `sheet_prefix`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub sheet: Option<String>,
    #[serde(default)]
    pub header_row: Option<usize>,
}

impl Settings {
    /// Get the default settings file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("stockscope");
        config_dir.join("stockscope.toml")
    }

    /// Load settings.
    ///
    /// An explicit `path` must exist. Without one, the default location is
    /// tried and built-in defaults are used when it is absent.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (Self::config_path(), false),
        };

        if !path.exists() {
            if explicit {
                return Err(ConfigError::NotFound(path));
            }
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let mut settings = Self::from_toml(&contents)?;
        if let Some(base) = path.parent() {
            settings.anchor_paths(base);
        }
        Ok(settings)
    }

    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let settings: Settings = toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.branches.is_empty() {
            return Err(ConfigError::Validation("at least one branch is required".into()));
        }

        let mut seen: Vec<String> = Vec::new();
        for branch in self.branches.iter() {
            let trimmed = branch.trim();
            if trimmed.is_empty() {
                return Err(ConfigError::Validation("branch names cannot be blank".into()));
            }
            if trimmed.eq_ignore_ascii_case(GLOBAL_BRANCH) {
                return Err(ConfigError::Validation(format!(
                    "'{GLOBAL_BRANCH}' is reserved for the computed total"
                )));
            }
            let key = trimmed.to_ascii_uppercase();
            if seen.contains(&key) {
                return Err(ConfigError::Validation(format!("duplicate branch '{trimmed}'")));
            }
            seen.push(key);
        }

        if self.search.limit == 0 {
            return Err(ConfigError::Validation("search.limit must be greater than 0".into()));
        }

        for source in &self.ingest.sources {
            if source.sheet.is_some() && source.branch.is_none() {
                return Err(ConfigError::Validation(format!(
                    "source '{}': a pinned sheet needs an explicit branch",
                    source.path.display()
                )));
            }
        }

        Ok(())
    }

    /// Resolve relative database/source paths against the config file's directory.
    fn anchor_paths(&mut self, base: &Path) {
        if self.database.is_relative() {
            self.database = base.join(&self.database);
        }
        for source in &mut self.ingest.sources {
            if source.path.is_relative() {
                source.path = base.join(&source.path);
            }
        }
    }

    /// Header row for `source`: per-source override, then the global one.
    pub fn header_row_for(&self, source: &SourceConfig) -> Option<usize> {
        source.header_row.or(self.ingest.header_row)
    }

    /// Write a commented starter file. Refuses to overwrite.
    pub fn write_default_file(path: &Path) -> Result<(), ConfigError> {
        if path.exists() {
            return Err(ConfigError::Validation(format!(
                "{} already exists",
                path.display()
            )));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, DEFAULT_CONFIG).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Get the config file path for display
    pub fn config_path_display() -> String {
        Self::config_path().to_string_lossy().to_string()
    }
}

const DEFAULT_CONFIG: &str = r#"# stockscope settings

# SQLite snapshot written by `sscope build` (relative to this file)
database = "inventario.db"

# Real branches, in display priority order
branches = ["HI", "EX", "MT", "SA", "ADE"]

[search]
limit = 100
min_query_len = 2

[ingest]
# Sheets starting with this prefix become branches: "Class(HI)" -> HI
sheet_prefix = "class"
# Zero-based header row; omit to auto-detect
# header_row = 8

# Column rules: a list of header aliases or a zero-based position
# [ingest.columns]
# code = ["cve_prod", "codigo"]
# stock = 3

# [[ingest.sources]]
# path = "clasificacion.xlsx"

# [[ingest.sources]]
# path = "ex.csv"
# branch = "EX"
"#;
