//! CLI argument parsing using clap.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

use crate::config::{CollisionPolicy, LineEnding};

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Glossary anchor tool
#[derive(Parser)]
#[command(
    name = "dicanchor",
    version = env!("CARGO_PKG_VERSION"),
    about = "Term anchors and deep-link highlighting for glossary pages",
    long_about = "Annotate glossary entry blocks with stable term identifiers, inject the \
                  deep-link highlight behaviour and write the term index used by the site linker.",
    next_line_help = true,
    styles = clap_cargo_style()
)]
pub struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Show detailed loading information
    #[arg(long, global = true)]
    pub info: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Initialize project
    #[command(about = "Set up .dicanchor directory with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Show current configuration settings
    #[command(about = "Display active settings")]
    Config,

    /// Annotate the glossary page and write the term index
    #[command(
        about = "Add term identifiers to a glossary page",
        after_help = "Examples:\n  dicanchor annotate\n  dicanchor annotate --input dic.html --output dic_experimental.html --index data/dic_terms_index.json\n  dicanchor annotate --collision keep-first --dry-run"
    )]
    Annotate {
        /// Glossary page to read (overrides config)
        #[arg(short, long, value_name = "PATH")]
        input: Option<PathBuf>,

        /// Annotated page to write (overrides config)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Term index JSON to write (overrides config)
        #[arg(long, value_name = "PATH")]
        index: Option<PathBuf>,

        /// Collision handling (overrides config)
        #[arg(long, value_enum)]
        collision: Option<CollisionPolicy>,

        /// Line endings of the written page (overrides config)
        #[arg(long, value_enum)]
        line_ending: Option<LineEnding>,

        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Print normalized identifiers for raw terms
    #[command(
        about = "Normalize terms into identifiers",
        after_help = "Examples:\n  dicanchor normalize \"Über-Lied\"\n  dicanchor normalize \"Sehr langsam\" \"Tempo I\" --json"
    )]
    Normalize {
        /// Raw terms
        #[arg(required = true, value_name = "TERM")]
        terms: Vec<String>,

        /// Output records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Link indexed terms in text
    #[command(
        about = "Wrap indexed terms in links to the glossary",
        after_help = "Reads standard input when no text is given.\n\nExamples:\n  dicanchor link \"Sehr langsam und zart\"\n  cat lyrics.txt | dicanchor link --index data/dic_terms_index.json"
    )]
    Link {
        /// Term index JSON (defaults to the configured index path)
        #[arg(long, value_name = "PATH")]
        index: Option<PathBuf>,

        /// Glossary page the links point to (overrides config)
        #[arg(long)]
        page: Option<String>,

        /// Text to link
        #[arg(value_name = "TEXT")]
        text: Vec<String>,
    },
}
