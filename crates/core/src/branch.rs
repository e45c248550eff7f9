use serde::{Deserialize, Serialize};

/// Synthetic branch holding the per-product total across real branches.
pub const GLOBAL_BRANCH: &str = "Global";

/// Real branches of the default deployment, in display priority order.
pub const DEFAULT_BRANCHES: [&str; 5] = ["HI", "EX", "MT", "SA", "ADE"];

/// The fixed, ordered set of real branches.
///
/// Order is significant: it drives detail layout and decides which branch
/// record donates the description/classification of a Global row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BranchSet(Vec<String>);

impl BranchSet {
    pub fn new<I, S>(branches: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(branches.into_iter().map(Into::into).collect())
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Canonical spelling of `name` if it is a real branch (case-insensitive).
    pub fn resolve(&self, name: &str) -> Option<&str> {
        let name = name.trim();
        self.0
            .iter()
            .find(|b| b.eq_ignore_ascii_case(name))
            .map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    /// Position in priority order. Global and unknown branches sort last.
    pub fn rank(&self, name: &str) -> usize {
        self.0
            .iter()
            .position(|b| b == name)
            .unwrap_or(self.0.len())
    }
}

impl Default for BranchSet {
    fn default() -> Self {
        Self::new(DEFAULT_BRANCHES)
    }
}
