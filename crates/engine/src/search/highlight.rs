//! Query highlighting for display text.

use regex::RegexBuilder;

pub const MARK_OPEN: &str = "<mark>";
pub const MARK_CLOSE: &str = "</mark>";

/// Upper bound on the compiled pattern; user input is untrusted.
const PATTERN_SIZE_LIMIT: usize = 1 << 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Highlight {
    Marked(String),
    /// Text returned as-is: empty term, invalid pattern, or no match.
    Unchanged(String),
}

impl Highlight {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Marked(s) | Self::Unchanged(s) => s,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Self::Marked(s) | Self::Unchanged(s) => s,
        }
    }

    pub fn is_marked(&self) -> bool {
        matches!(self, Self::Marked(_))
    }

    /// The text without highlighting. Always equals the input of `highlight`.
    pub fn plain_text(&self) -> String {
        match self {
            Self::Marked(s) => strip_markers(s),
            Self::Unchanged(s) => s.clone(),
        }
    }
}

/// Wrap every case-insensitive occurrence of `term` in `text` with markers.
///
/// `term` is used as a regular expression. A pattern that fails to compile
/// leaves the text untouched. Empty matches are never marked. Text that
/// already contains a marker string is never marked either, since the
/// result could not be told apart from our own markers.
pub fn highlight(text: &str, term: &str) -> Highlight {
    let term = term.trim();
    if term.is_empty() || text.contains(MARK_OPEN) || text.contains(MARK_CLOSE) {
        return Highlight::Unchanged(text.to_string());
    }
    let re = match RegexBuilder::new(term)
        .case_insensitive(true)
        .size_limit(PATTERN_SIZE_LIMIT)
        .build()
    {
        Ok(re) => re,
        Err(e) => {
            log::debug!("highlight pattern {term:?} rejected: {e}");
            return Highlight::Unchanged(text.to_string());
        }
    };

    let mut out = String::with_capacity(text.len() + 16);
    let mut last = 0;
    let mut marked = false;
    for m in re.find_iter(text).filter(|m| !m.is_empty()) {
        out.push_str(&text[last..m.start()]);
        out.push_str(MARK_OPEN);
        out.push_str(m.as_str());
        out.push_str(MARK_CLOSE);
        last = m.end();
        marked = true;
    }
    if !marked {
        return Highlight::Unchanged(text.to_string());
    }
    out.push_str(&text[last..]);
    Highlight::Marked(out)
}

/// Remove highlight markers from `Highlight::Marked` text.
pub fn strip_markers(text: &str) -> String {
    text.replace(MARK_OPEN, "").replace(MARK_CLOSE, "")
}
