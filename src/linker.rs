//! Term linking against a persisted index.
//!
//! Offline counterpart of the page-side linker: source text is tokenized with
//! delimiters kept, and the longest run of tokens whose normalized form is in
//! the index becomes a link to the glossary anchor.

use std::sync::OnceLock;

use regex::Regex;

use crate::annotate::TermIndex;
use crate::config::LinkConfig;
use crate::normalize::normalize_term;

static DELIMITER: OnceLock<Regex> = OnceLock::new();

fn delimiter_regex() -> &'static Regex {
    DELIMITER.get_or_init(|| {
        Regex::new(r#"\s+|[()\[\]{}'":;,]|\."#).expect("delimiter pattern is valid")
    })
}

/// Characters that make a token a delimiter wherever they appear in it.
const DELIMITER_CHARS: &[char] = &['(', ')', '[', ']', '{', '}', '\'', '"', ':', ';', ',', '.'];

/// Split text into word and delimiter tokens, delimiters kept.
///
/// A `.` next to a digit on either side (`3.5`, `Nr.5`, `5.`) stays inside
/// its word.
pub fn tokenize(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;

    for m in delimiter_regex().find_iter(text) {
        if m.as_str() == "." {
            let before = text[..m.start()].chars().next_back();
            let after = text[m.end()..].chars().next();
            if before.is_some_and(|c| c.is_ascii_digit()) || after.is_some_and(|c| c.is_ascii_digit()) {
                continue;
            }
        }
        if m.start() > start {
            tokens.push(&text[start..m.start()]);
        }
        tokens.push(m.as_str());
        start = m.end();
    }
    if start < text.len() {
        tokens.push(&text[start..]);
    }
    tokens
}

fn is_delimiter(token: &str) -> bool {
    token.starts_with(char::is_whitespace) || token.contains(DELIMITER_CHARS)
}

/// Escape text for HTML content and double-quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// A phrase found in the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermMatch<'t> {
    pub text: String,
    pub id: &'t str,
    /// Tokens consumed, delimiters included.
    pub tokens: usize,
}

pub struct TermLinker<'a> {
    index: &'a TermIndex,
    config: &'a LinkConfig,
}

impl<'a> TermLinker<'a> {
    pub fn new(index: &'a TermIndex, config: &'a LinkConfig) -> Self {
        Self { index, config }
    }

    /// Longest indexed phrase starting at `tokens[at]`, looking at most
    /// `max_lookahead` tokens past the first.
    pub fn longest_match(&self, tokens: &[&str], at: usize) -> Option<TermMatch<'a>> {
        let mut best = None;
        let mut phrase = String::new();
        let last = tokens.len().min(at + 1 + self.config.max_lookahead);

        for (offset, token) in tokens[at..last].iter().enumerate() {
            phrase.push_str(token);
            // A link never ends on trailing punctuation or whitespace.
            if is_delimiter(token) {
                continue;
            }
            if let Some(id) = self.index.get(&normalize_term(&phrase)) {
                best = Some(TermMatch {
                    text: phrase.clone(),
                    id,
                    tokens: offset + 1,
                });
            }
        }
        best
    }

    /// Link every indexed phrase of a single line of text.
    pub fn link(&self, text: &str) -> String {
        let tokens = tokenize(text);
        let mut html = String::with_capacity(text.len() * 2);
        let mut i = 0;

        while i < tokens.len() {
            let token = tokens[i];
            if is_delimiter(token) {
                html.push_str(&escape_html(token));
                i += 1;
                continue;
            }

            match self.longest_match(&tokens, i) {
                Some(found) => {
                    html.push_str(&self.anchor(&found));
                    i += found.tokens;
                }
                None => {
                    html.push_str(&escape_html(token));
                    i += 1;
                }
            }
        }
        html
    }

    /// Link multi-line text, lines joined with `<br>`.
    pub fn link_lines(&self, text: &str) -> String {
        text.lines()
            .map(|line| self.link(line.trim()))
            .collect::<Vec<_>>()
            .join("<br>")
    }

    fn anchor(&self, found: &TermMatch<'_>) -> String {
        let text = escape_html(&found.text);
        format!(
            r#"<a href="{page}#{id}" title="{title}{text}" class="{class}">{text}</a>"#,
            page = escape_html(&self.config.page),
            id = escape_html(found.id),
            title = escape_html(&self.config.title_prefix),
            class = escape_html(&self.config.link_class),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CollisionPolicy;

    fn index(keys: &[&str]) -> TermIndex {
        let mut index = TermIndex::new();
        for key in keys {
            index
                .insert(key, &format!("term-{key}"), key, CollisionPolicy::Overwrite)
                .unwrap();
        }
        index
    }

    #[test]
    fn test_tokenize_keeps_delimiters() {
        assert_eq!(
            tokenize("Sehr langsam (Tempo I)."),
            ["Sehr", " ", "langsam", " ", "(", "Tempo", " ", "I", ")", "."]
        );
        assert_eq!(tokenize("Takt 3.5 bis"), ["Takt", " ", "3.5", " ", "bis"]);
        assert_eq!(tokenize("Nr.5 und 5. Satz"), ["Nr.5", " ", "und", " ", "5.", " ", "Satz"]);
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn test_longest_phrase_wins() {
        let index = index(&["sehr", "sehr-langsam"]);
        let config = LinkConfig::default();
        let linker = TermLinker::new(&index, &config);

        let html = linker.link("Sehr langsam, sehr.");
        assert_eq!(
            html,
            "<a href=\"dic_experimental.html#term-sehr-langsam\" title=\"用語集で確認: Sehr langsam\" class=\"dic-link\">Sehr langsam</a>, \
             <a href=\"dic_experimental.html#term-sehr\" title=\"用語集で確認: sehr\" class=\"dic-link\">sehr</a>."
        );
    }

    #[test]
    fn test_dot_next_to_digit_is_not_linked() {
        let index = index(&["nr"]);
        let config = LinkConfig::default();
        let linker = TermLinker::new(&index, &config);
        assert_eq!(linker.link("Nr.5"), "Nr.5");
        assert!(linker.link("Nr. 5").starts_with("<a href=\"dic_experimental.html#term-nr\""));
    }

    #[test]
    fn test_umlaut_phrase_matches_index_key() {
        let index = index(&["ueber-lied"]);
        let config = LinkConfig::default();
        let linker = TermLinker::new(&index, &config);
        assert!(linker.link("das Über Lied").contains("#term-ueber-lied"));
    }

    #[test]
    fn test_unmatched_text_is_escaped() {
        let index = index(&[]);
        let config = LinkConfig::default();
        let linker = TermLinker::new(&index, &config);
        assert_eq!(linker.link("a < b & c"), "a &lt; b &amp; c");
    }

    #[test]
    fn test_lookahead_limit() {
        let index = index(&["a-b-c"]);
        let config = LinkConfig {
            max_lookahead: 2,
            ..LinkConfig::default()
        };
        let linker = TermLinker::new(&index, &config);
        // "a b c" needs four extra tokens including spaces.
        assert!(!linker.link("a b c").contains("<a "));

        let wide = LinkConfig::default();
        let linker = TermLinker::new(&index, &wide);
        assert!(linker.link("a b c").contains("#term-a-b-c"));
    }

    #[test]
    fn test_link_lines() {
        let index = index(&["tempo"]);
        let config = LinkConfig::default();
        let linker = TermLinker::new(&index, &config);
        let html = linker.link_lines("Tempo\n  ruhig ");
        assert!(html.ends_with("</a><br>ruhig"));
    }
}
