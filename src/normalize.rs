//! Term normalization.
//!
//! Turns a display term (`"Über-Lied"`, `"Adagietto. Sehr langsam"`) into an
//! identifier usable both as an HTML attribute value and as a URL fragment.
//! The page-side linker runs the same algorithm on incoming hash fragments,
//! so any change here must be mirrored there.

use serde::Serialize;

/// Separator placed between words of a normalized identifier.
pub const SEPARATOR: char = '-';

/// Fixed fold table for the diacritics that occur in the glossary.
const FOLDS: &[(char, &str)] = &[('ä', "ae"), ('ö', "oe"), ('ü', "ue"), ('ß', "ss")];

/// A raw term paired with its normalized identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermRecord {
    pub term: String,
    pub normalized: String,
}

impl TermRecord {
    pub fn new(term: impl Into<String>) -> Self {
        let term = term.into();
        let normalized = normalize_term(&term);
        Self { term, normalized }
    }

    /// Qualified identifier for this record, `None` when nothing survived normalization.
    pub fn id(&self, prefix: &str) -> Option<String> {
        (!self.normalized.is_empty()).then(|| term_id(prefix, &self.normalized))
    }
}

/// Normalize a raw term into `[a-z0-9-]*`.
///
/// Lowercases, folds umlauts and `ß`, maps whitespace to `-`, drops every
/// other character outside the allowed set, then collapses and trims
/// separators. Total and idempotent.
pub fn normalize_term(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let mut out = String::with_capacity(lowered.len());

    for ch in lowered.chars() {
        if let Some((_, folded)) = FOLDS.iter().find(|(from, _)| *from == ch) {
            out.push_str(folded);
        } else if ch.is_whitespace() || ch == SEPARATOR {
            // Collapse while building; leading separators are skipped here too.
            if !out.is_empty() && !out.ends_with(SEPARATOR) {
                out.push(SEPARATOR);
            }
        } else if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            out.push(ch);
        }
    }

    while out.ends_with(SEPARATOR) {
        out.pop();
    }
    out
}

/// Build the qualified identifier embedded in markup.
pub fn term_id(prefix: &str, normalized: &str) -> String {
    format!("{prefix}{normalized}")
}
