//! Link command - wrap indexed terms in glossary links.

use std::io::Read;
use std::path::PathBuf;

use crate::annotate::TermIndex;
use crate::config::Settings;
use crate::linker::TermLinker;

/// Run link command.
pub fn run(index: Option<PathBuf>, page: Option<String>, text: &[String], settings: &Settings) {
    let index_path = index.unwrap_or_else(|| settings.paths.index.clone());
    let index = match TermIndex::load(&index_path) {
        Ok(index) => index,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(e.exit_code());
        }
    };
    tracing::debug!("[link] loaded {} terms from {}", index.len(), index_path.display());

    let mut config = settings.link.clone();
    if let Some(page) = page {
        config.page = page;
    }

    let input = if text.is_empty() {
        let mut buf = String::new();
        if let Err(e) = std::io::stdin().read_to_string(&mut buf) {
            eprintln!("Error reading standard input: {e}");
            std::process::exit(1);
        }
        buf
    } else {
        text.join(" ")
    };

    let linker = TermLinker::new(&index, &config);
    println!("{}", linker.link_lines(&input));
}
