//! Glossary annotation.
//!
//! Two passes over the document with a streaming HTML rewriter:
//! 1. [`scan::scan_entries`] collects every entry block and its term text
//! 2. the rewrite pass tags blocks that carry no identifier yet, appends the
//!    highlight rule to the first stylesheet and inserts the hash handler
//!    before the script marker
//!
//! Both outputs are rendered in memory before anything is written.

pub mod index;
pub mod inject;
pub mod scan;

use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use lol_html::html_content::ContentType;
use lol_html::{RewriteStrSettings, Selector, element, end_tag, rewrite_str, text};

use crate::config::AnnotateConfig;
use crate::error::{AnnotateError, AnnotateResult};
use crate::normalize::TermRecord;
use crate::{debug_event, log_event};

pub use index::{Collision, TermIndex};
pub use scan::EntryCandidate;

/// Outcome of one annotation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotateReport {
    /// Blocks matching the block selector
    pub blocks: usize,
    /// Blocks that received an identifier in this run
    pub annotated: usize,
    /// Blocks left alone because they already carried an identifier
    pub already_tagged: usize,
    /// Blocks without a usable term
    pub skipped: usize,
    /// Entries in the written index
    pub indexed_terms: usize,
    pub collisions: Vec<Collision>,
    pub css_injected: bool,
    pub script_injected: bool,
}

/// Transformed page and its index, not yet written.
#[derive(Debug, Clone)]
pub struct AnnotatedDocument {
    pub html: String,
    pub index: TermIndex,
    pub report: AnnotateReport,
}

/// Where an annotation run reads and writes.
#[derive(Debug, Clone)]
pub struct AnnotatePaths {
    pub input: PathBuf,
    pub output: PathBuf,
    pub index: PathBuf,
}

pub struct Annotator {
    config: AnnotateConfig,
}

impl Annotator {
    /// Create an annotator, validating selectors and the attribute name up front.
    pub fn new(config: AnnotateConfig) -> AnnotateResult<Self> {
        for selector in [&config.block_selector, &config.term_selector] {
            selector
                .parse::<Selector>()
                .map_err(|e| AnnotateError::Selector {
                    selector: selector.clone(),
                    reason: e.to_string(),
                })?;
        }
        validate_attribute_name(&config.id_attribute)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnnotateConfig {
        &self.config
    }

    /// Annotate an in-memory document.
    pub fn annotate_str(&self, html: &str) -> AnnotateResult<AnnotatedDocument> {
        let config = &self.config;
        let entries = scan::scan_entries(html, config)?;
        log_event!("annotate", "scanned", "{} entry blocks", entries.len());

        let mut report = AnnotateReport {
            blocks: entries.len(),
            ..AnnotateReport::default()
        };
        let mut index = TermIndex::new();
        let mut assignments: Vec<Option<String>> = Vec::with_capacity(entries.len());

        for entry in &entries {
            let record = TermRecord::new(entry.term.as_str());
            let Some(generated) = record.id(&config.id_prefix) else {
                debug_event!("annotate", "skipped", "block {} has no usable term", entry.ordinal);
                report.skipped += 1;
                assignments.push(None);
                continue;
            };

            let embedded = match &entry.existing_id {
                Some(existing) => {
                    report.already_tagged += 1;
                    assignments.push(None);
                    existing.clone()
                }
                None => {
                    debug_event!("annotate", "tagging", "{} -> {}", entry.term, generated);
                    report.annotated += 1;
                    assignments.push(Some(generated.clone()));
                    generated
                }
            };

            if let Some(collision) =
                index.insert(&record.normalized, &embedded, &record.term, config.collision)?
            {
                tracing::warn!(
                    "[annotate] collision on '{}': '{}' and '{}' (index keeps {})",
                    collision.key,
                    collision.first_term,
                    collision.second_term,
                    collision.resolved_id
                );
                report.collisions.push(collision);
            }
        }

        let (html, css_injected, script_injected) = self.rewrite(html, &assignments)?;
        if !css_injected {
            debug_event!("annotate", "stylesheet", "no <style> to extend or rule present");
        }
        if !script_injected {
            tracing::warn!(
                "[annotate] script marker '{}' not found or handler present; hash handler not inserted",
                config.script_marker
            );
        }

        report.indexed_terms = index.len();
        report.css_injected = css_injected;
        report.script_injected = script_injected;

        Ok(AnnotatedDocument {
            html,
            index,
            report,
        })
    }

    /// Second pass: tag blocks and splice snippets.
    fn rewrite(
        &self,
        html: &str,
        assignments: &[Option<String>],
    ) -> AnnotateResult<(String, bool, bool)> {
        let config = &self.config;
        let ordinal = Cell::new(0usize);

        let style_buf = RefCell::new(String::new());
        let style_count = Cell::new(0usize);
        // Set once the first stylesheet has been handled, by its text or its end tag.
        let style_done = Rc::new(Cell::new(false));
        let css_injected = Rc::new(Cell::new(false));

        let script_buf = RefCell::new(String::new());
        let script_injected = Cell::new(false);
        // A handler anywhere in the document means a previous run placed it.
        let handler_present = html.contains(&inject::hash_handler_sentinel(config));
        if handler_present {
            debug_event!("annotate", "script", "hash handler already present");
        }

        let output = rewrite_str(
            html,
            RewriteStrSettings {
                element_content_handlers: vec![
                    element!(config.block_selector.as_str(), |el| {
                        let i = ordinal.get();
                        ordinal.set(i + 1);
                        if let Some(Some(id)) = assignments.get(i) {
                            el.set_attribute(&config.id_attribute, id)?;
                        }
                        Ok(())
                    }),
                    // Only the first stylesheet receives the rule, even when it is empty.
                    element!("style", |el| {
                        style_count.set(style_count.get() + 1);
                        if style_count.get() > 1 {
                            return Ok(());
                        }
                        let Some(rule) = inject::splice_stylesheet("", config) else {
                            return Ok(());
                        };
                        if let Some(handlers) = el.end_tag_handlers() {
                            let style_done = Rc::clone(&style_done);
                            let css_injected = Rc::clone(&css_injected);
                            handlers.push(end_tag!(move |end| {
                                if !style_done.get() {
                                    style_done.set(true);
                                    end.before(&rule, ContentType::Html);
                                    css_injected.set(true);
                                }
                                Ok(())
                            }));
                        }
                        Ok(())
                    }),
                    text!("style", |t| {
                        if style_count.get() != 1 || style_done.get() {
                            return Ok(());
                        }
                        style_buf.borrow_mut().push_str(t.as_str());
                        if !t.last_in_text_node() {
                            t.remove();
                            return Ok(());
                        }
                        style_done.set(true);
                        let body = std::mem::take(&mut *style_buf.borrow_mut());
                        let spliced = inject::splice_stylesheet(&body, config);
                        css_injected.set(spliced.is_some());
                        t.replace(spliced.as_deref().unwrap_or(&body), ContentType::Html);
                        Ok(())
                    }),
                    text!("script", |t| {
                        script_buf.borrow_mut().push_str(t.as_str());
                        if !t.last_in_text_node() {
                            t.remove();
                            return Ok(());
                        }
                        let body = std::mem::take(&mut *script_buf.borrow_mut());
                        let spliced = if handler_present || script_injected.get() {
                            None
                        } else {
                            inject::splice_script(&body, config)
                        };
                        if spliced.is_some() {
                            script_injected.set(true);
                        }
                        t.replace(spliced.as_deref().unwrap_or(&body), ContentType::Html);
                        Ok(())
                    }),
                ],
                ..RewriteStrSettings::default()
            },
        )?;

        Ok((output, css_injected.get(), script_injected.get()))
    }

    /// Read, annotate and write both outputs.
    ///
    /// With `dry_run` nothing is written and the report is returned as is.
    pub fn run(&self, paths: &AnnotatePaths, dry_run: bool) -> AnnotateResult<AnnotateReport> {
        let source = std::fs::read_to_string(&paths.input).map_err(|source| AnnotateError::Read {
            path: paths.input.clone(),
            source,
        })?;

        let document = self.annotate_str(&source)?;
        let html = inject::convert_line_endings(&document.html, self.config.line_ending);
        let json = document.index.to_json()?;

        if dry_run {
            log_event!("annotate", "dry run", "nothing written");
            return Ok(document.report);
        }

        write_file(&paths.output, &html)?;
        write_file(&paths.index, &json)?;
        log_event!(
            "annotate",
            "written",
            "{} and {}",
            paths.output.display(),
            paths.index.display()
        );

        Ok(document.report)
    }
}

fn write_file(path: &Path, contents: &str) -> AnnotateResult<()> {
    let to_error = |source| AnnotateError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(to_error)?;
        }
    }
    std::fs::write(path, contents).map_err(to_error)
}

fn validate_attribute_name(name: &str) -> AnnotateResult<()> {
    let invalid = name
        .chars()
        .find(|c| c.is_whitespace() || c.is_control() || matches!(c, '"' | '\'' | '>' | '/' | '='));
    let reason = if name.is_empty() {
        Some("empty name".to_string())
    } else {
        invalid.map(|c| format!("contains {c:?}"))
    };
    match reason {
        Some(reason) => Err(AnnotateError::Attribute {
            name: name.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CollisionPolicy;

    const PAGE: &str = r#"<html><head><style>
        .row { padding: 4px; }
    </style></head><body>
<div class="row" id="letter-U">
  <div>
    <span class="german">Über-Lied</span><span class="source">III</span>
  </div>
  <div class="translation">歌を超えて</div>
</div>
<div class="row">
  <div>
    <span class="german">Sehr langsam</span>
  </div>
</div>
<script>
        function handleHash(hash) {
            // 略記一覧へのリンク
            if (hash === '#abbr') { return; }
        }
</script>
</body></html>"#;

    fn annotator() -> Annotator {
        Annotator::new(AnnotateConfig::default()).unwrap()
    }

    #[test]
    fn test_annotates_blocks() {
        let doc = annotator().annotate_str(PAGE).unwrap();

        assert!(doc.html.contains(r#"data-term-id="term-ueber-lied""#));
        assert!(doc.html.contains(r#"data-term-id="term-sehr-langsam""#));
        assert!(doc.html.contains(r#"id="letter-U""#));
        assert_eq!(doc.index.get("ueber-lied"), Some("term-ueber-lied"));
        assert_eq!(doc.report.blocks, 2);
        assert_eq!(doc.report.annotated, 2);
        assert_eq!(doc.report.indexed_terms, 2);
        assert!(doc.report.css_injected);
        assert!(doc.report.script_injected);
    }

    #[test]
    fn test_rerun_is_stable() {
        let first = annotator().annotate_str(PAGE).unwrap();
        let second = annotator().annotate_str(&first.html).unwrap();

        assert_eq!(second.html, first.html);
        assert_eq!(second.report.annotated, 0);
        assert_eq!(second.report.already_tagged, 2);
        assert_eq!(second.index, first.index);
    }

    #[test]
    fn test_handler_inserted_once_across_scripts() {
        let page = r#"<div class="row"><div><span class="german">Tempo</span></div></div>
<script>
    // 略記一覧へのリンク
    openAbbreviations();
</script>
<script>
    // 略記一覧へのリンク
    openAbbreviations();
</script>"#;
        let sentinel = r##"hash.startsWith("#term-")"##;

        let first = annotator().annotate_str(page).unwrap();
        assert!(first.report.script_injected);
        assert_eq!(first.html.matches(sentinel).count(), 1);

        let second = annotator().annotate_str(&first.html).unwrap();
        assert!(!second.report.script_injected);
        assert_eq!(second.html, first.html);
        assert_eq!(second.html.matches(sentinel).count(), 1);
    }

    #[test]
    fn test_empty_first_stylesheet_receives_rule() {
        let page = "<style></style><style>\n  p { margin: 0; }\n</style>";
        let doc = annotator().annotate_str(page).unwrap();

        assert!(doc.report.css_injected);
        let (first, second) = doc.html.split_once("</style>").unwrap();
        assert!(first.contains("div.row.highlight {"));
        assert!(!second.contains("div.row.highlight {"));

        let rerun = annotator().annotate_str(&doc.html).unwrap();
        assert_eq!(rerun.html, doc.html);
        assert!(!rerun.report.css_injected);
    }

    #[test]
    fn test_without_markers_only_blocks_change() {
        let page = r#"<div class="row"><div><span class="german">Tempo</span></div></div>"#;
        let doc = annotator().annotate_str(page).unwrap();
        assert_eq!(
            doc.html,
            r#"<div class="row" data-term-id="term-tempo"><div><span class="german">Tempo</span></div></div>"#
        );
        assert!(!doc.report.css_injected);
        assert!(!doc.report.script_injected);
    }

    #[test]
    fn test_existing_id_is_indexed_not_replaced() {
        let page = r#"<div class="row" id="term-adagio"><div><span class="german">Adagio</span></div></div>"#;
        let doc = annotator().annotate_str(page).unwrap();
        assert_eq!(doc.html, page);
        assert_eq!(doc.index.get("adagio"), Some("term-adagio"));
    }

    #[test]
    fn test_collision_policies() {
        let page = r#"
<div class="row"><div><span class="german">Tempo I</span></div></div>
<div class="row"><div><span class="german">Tempo (I)</span></div></div>"#;

        let doc = annotator().annotate_str(page).unwrap();
        assert_eq!(doc.report.collisions.len(), 1);
        assert_eq!(doc.report.indexed_terms, 1);
        assert_eq!(doc.report.annotated, 2);

        let strict = Annotator::new(AnnotateConfig {
            collision: CollisionPolicy::Error,
            ..AnnotateConfig::default()
        })
        .unwrap();
        assert!(matches!(
            strict.annotate_str(page),
            Err(AnnotateError::Collision { .. })
        ));
    }

    #[test]
    fn test_invalid_configuration() {
        let bad_selector = Annotator::new(AnnotateConfig {
            block_selector: "div[".to_string(),
            ..AnnotateConfig::default()
        });
        assert!(matches!(bad_selector, Err(AnnotateError::Selector { .. })));

        let bad_attr = Annotator::new(AnnotateConfig {
            id_attribute: "data term".to_string(),
            ..AnnotateConfig::default()
        });
        assert!(matches!(bad_attr, Err(AnnotateError::Attribute { .. })));
    }
}
