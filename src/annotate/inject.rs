//! Highlight stylesheet rule and hash-router snippet.
//!
//! Both operate on the raw text of a `<style>` or `<script>` element and
//! return `None` when nothing has to change.

use crate::config::{AnnotateConfig, LineEnding};

const HASH_HANDLER_TEMPLATE: &str = r#"// Term deep links (#__PREFIX_TEXT__...)
if (hash.startsWith(__PREFIX__)) {
    const termId = decodeURIComponent(hash.substring(1));
    const targetElement = document.querySelector('[' + __ATTR__ + '="' + CSS.escape(termId) + '"]');

    if (targetElement) {
        document.querySelectorAll(__HIGHLIGHTED__).forEach(el => {
            el.classList.remove(__CLASS__);
        });
        if (window.__termHighlightTimer) {
            clearTimeout(window.__termHighlightTimer);
        }

        targetElement.classList.add(__CLASS__);
        targetElement.scrollIntoView({ behavior: 'auto', block: 'start' });

        window.__termHighlightTimer = setTimeout(() => {
            targetElement.classList.remove(__CLASS__);
            window.__termHighlightTimer = null;
        }, __DELAY__);
    }
    return;
}"#;

/// Selector of a highlighted block, e.g. `div.row.highlight`.
pub fn highlighted_selector(config: &AnnotateConfig) -> String {
    format!("{}.{}", config.block_selector, config.highlight_class)
}

/// CSS rule for the highlight state.
pub fn highlight_css(config: &AnnotateConfig) -> String {
    format!(
        "/* Highlight for blocks reached through a term link */\n{} {{\n    background-color: #ffffcc;\n    transition: background-color 0.5s ease;\n}}",
        highlighted_selector(config)
    )
}

/// Hash-router branch handling `#<prefix>...` fragments.
pub fn hash_handler_js(config: &AnnotateConfig) -> String {
    HASH_HANDLER_TEMPLATE
        .replace("__PREFIX_TEXT__", &config.id_prefix)
        .replace("__PREFIX__", &js_string(&format!("#{}", config.id_prefix)))
        .replace("__ATTR__", &js_string(&config.id_attribute))
        .replace("__HIGHLIGHTED__", &js_string(&highlighted_selector(config)))
        .replace("__CLASS__", &js_string(&config.highlight_class))
        .replace("__DELAY__", &config.highlight_ms.to_string())
}

/// Sentinel identifying an already injected hash handler.
pub(crate) fn hash_handler_sentinel(config: &AnnotateConfig) -> String {
    format!(
        "hash.startsWith({})",
        js_string(&format!("#{}", config.id_prefix))
    )
}

fn js_string(value: &str) -> String {
    // A JSON string literal is a valid JavaScript string literal.
    serde_json::Value::String(value.to_string()).to_string()
}

/// Append the highlight rule at the end of a stylesheet body.
///
/// The rule takes the indentation of the last non-blank line and the
/// trailing whitespace (the closing tag's indentation) is preserved.
pub fn splice_stylesheet(stylesheet: &str, config: &AnnotateConfig) -> Option<String> {
    if stylesheet.contains(&format!("{} {{", highlighted_selector(config))) {
        return None;
    }

    let body = stylesheet.trim_end();
    let tail = &stylesheet[body.len()..];
    let indent = body
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .map(leading_whitespace)
        .unwrap_or_default();

    let mut out = String::with_capacity(stylesheet.len() + 256);
    out.push_str(body);
    if !body.is_empty() {
        out.push('\n');
    }
    out.push('\n');
    out.push_str(&indent_block(&highlight_css(config), indent, true));
    out.push_str(if tail.is_empty() { "\n" } else { tail });
    Some(out)
}

/// Insert the hash handler right before the marker comment of a script body.
pub fn splice_script(script: &str, config: &AnnotateConfig) -> Option<String> {
    if config.script_marker.is_empty() || script.contains(&hash_handler_sentinel(config)) {
        return None;
    }
    let pos = script.find(&config.script_marker)?;

    let line_start = script[..pos].rfind('\n').map_or(0, |i| i + 1);
    let before_marker = &script[line_start..pos];
    let indent = if before_marker.trim().is_empty() {
        before_marker
    } else {
        ""
    };

    let mut out = String::with_capacity(script.len() + HASH_HANDLER_TEMPLATE.len() + 256);
    out.push_str(&script[..pos]);
    // The first line inherits the marker's indentation already in place.
    out.push_str(&indent_block(&hash_handler_js(config), indent, false));
    out.push('\n');
    out.push_str(indent);
    out.push_str(&script[pos..]);
    Some(out)
}

fn leading_whitespace(line: &str) -> &str {
    &line[..line.len() - line.trim_start().len()]
}

fn indent_block(block: &str, indent: &str, indent_first: bool) -> String {
    let mut out = String::with_capacity(block.len() + indent.len() * 32);
    for (i, line) in block.lines().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        if !line.is_empty() && (i > 0 || indent_first) {
            out.push_str(indent);
        }
        out.push_str(line);
    }
    out
}

/// Convert line endings of the whole document.
///
/// `Crlf` turns every lone `\n` into `\r\n` and leaves existing pairs alone.
pub fn convert_line_endings(text: &str, ending: LineEnding) -> String {
    match ending {
        LineEnding::Lf => text.replace("\r\n", "\n"),
        LineEnding::Crlf => {
            let mut out = String::with_capacity(text.len() + text.len() / 32);
            let mut prev = '\0';
            for ch in text.chars() {
                if ch == '\n' && prev != '\r' {
                    out.push('\r');
                }
                out.push(ch);
                prev = ch;
            }
            out
        }
    }
}
