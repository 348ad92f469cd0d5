//! First pass: collect entry blocks and their term text.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use lol_html::{RewriteStrSettings, element, end_tag, rewrite_str, text};

use crate::config::AnnotateConfig;
use crate::error::AnnotateResult;

/// One entry block as found in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryCandidate {
    /// Position among all blocks matching the block selector.
    pub ordinal: usize,
    /// Term text, entity-decoded and trimmed. Empty when the block has no term element.
    pub term: String,
    /// Identifier the block already carries, if any.
    pub existing_id: Option<String>,
}

/// Walk `html` and return one candidate per block, in document order.
///
/// Only the first term element of each block contributes text, including the
/// text of inline markup nested in it. Selectors are expected to be validated
/// by the caller.
pub fn scan_entries(html: &str, config: &AnnotateConfig) -> AnnotateResult<Vec<EntryCandidate>> {
    // Second tuple field: the block's term element has been seen.
    let candidates: RefCell<Vec<(EntryCandidate, bool)>> = RefCell::new(Vec::new());
    // Shared with the term element's end tag handler, which must be 'static.
    let capturing = Rc::new(Cell::new(false));

    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!(config.block_selector.as_str(), |el| {
                    let existing_id = el
                        .get_attribute(&config.id_attribute)
                        .filter(|id| !id.trim().is_empty())
                        .or_else(|| {
                            el.get_attribute("id")
                                .filter(|id| id.starts_with(&config.id_prefix))
                        });
                    let mut all = candidates.borrow_mut();
                    let ordinal = all.len();
                    all.push((
                        EntryCandidate {
                            ordinal,
                            term: String::new(),
                            existing_id,
                        },
                        false,
                    ));
                    capturing.set(false);
                    Ok(())
                }),
                element!(config.term_selector.as_str(), |el| {
                    match candidates.borrow_mut().last_mut() {
                        Some((_, seen)) if !*seen => {
                            *seen = true;
                            capturing.set(true);
                        }
                        _ => {
                            capturing.set(false);
                            return Ok(());
                        }
                    }
                    if let Some(handlers) = el.end_tag_handlers() {
                        let capturing = Rc::clone(&capturing);
                        handlers.push(end_tag!(move |_end| {
                            capturing.set(false);
                            Ok(())
                        }));
                    }
                    Ok(())
                }),
                text!(config.term_selector.as_str(), |t| {
                    if capturing.get() {
                        if let Some((candidate, _)) = candidates.borrow_mut().last_mut() {
                            candidate.term.push_str(t.as_str());
                        }
                    }
                    Ok(())
                }),
            ],
            ..RewriteStrSettings::default()
        },
    )?;

    let entries = candidates
        .into_inner()
        .into_iter()
        .map(|(mut candidate, _)| {
            candidate.term = decode_entities(candidate.term.trim()).trim().to_string();
            candidate
        })
        .collect();

    Ok(entries)
}

/// Decode the character references an HTML text node can carry.
///
/// Covers the named entities the glossary generator emits plus numeric
/// references. Unknown references are kept verbatim.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail
            .find(';')
            .filter(|&end| end <= 10)
            .and_then(|end| decode_reference(&tail[1..end]).map(|ch| (ch, end)));

        match decoded {
            Some((ch, end)) => {
                out.push(ch);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_reference(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let code = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                name.strip_prefix('#')?.parse::<u32>().ok()?
            };
            char::from_u32(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><body>
<div class="row" id="letter-A">
  <div>
    <span class="german">Adagio</span><span class="source">M1</span>
  </div>
  <div class="translation">ゆっくり</div>
</div>
<div class="row" data-term-id="term-allegro">
  <div>
    <span class="german"> Allegro </span>
  </div>
</div>
<div class="row">
  <div><span class="german">Ton &amp; Farbe</span><span class="german">ignored</span></div>
</div>
<div class="row"><div class="translation">no term here</div></div>
<div class="row" id="term-presto"><div><span class="german">Presto</span></div></div>
</body></html>"#;

    #[test]
    fn test_scan_collects_blocks_in_order() {
        let entries = scan_entries(PAGE, &AnnotateConfig::default()).unwrap();
        assert_eq!(entries.len(), 5);

        assert_eq!(entries[0].term, "Adagio");
        assert_eq!(entries[0].existing_id, None);

        assert_eq!(entries[1].term, "Allegro");
        assert_eq!(entries[1].existing_id.as_deref(), Some("term-allegro"));

        assert_eq!(entries[2].term, "Ton & Farbe");
        assert_eq!(entries[3].term, "");

        assert_eq!(entries[4].existing_id.as_deref(), Some("term-presto"));
        assert!(entries.iter().enumerate().all(|(i, e)| e.ordinal == i));
    }

    #[test]
    fn test_scan_keeps_text_of_nested_markup() {
        let page = r#"<div class="row"><div><span class="german">Sehr <i>langsam</i> und <b>zart</b></span><span class="german">Rest</span></div></div>
<div class="row"><div><span class="german">Presto</span></div></div>"#;
        let entries = scan_entries(page, &AnnotateConfig::default()).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].term, "Sehr langsam und zart");
        assert_eq!(entries[1].term, "Presto");
    }

    #[test]
    fn test_scan_without_blocks() {
        let entries = scan_entries("<p>nothing</p>", &AnnotateConfig::default()).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("Ton &amp; Farbe"), "Ton & Farbe");
        assert_eq!(decode_entities("&#220;ber &#xFC;ber"), "Über über");
        assert_eq!(decode_entities("a &unknown; b & c"), "a &unknown; b & c");
        assert_eq!(decode_entities("plain"), "plain");
    }
}
