//! Layered configuration.
//!
//! Sources, lowest to highest precedence:
//! - Default values
//! - `.dicanchor/settings.toml` (searched upward from the current directory)
//! - Environment variables
//! - CLI argument overrides (applied by the command runners)
//!
//! # Environment Variables
//!
//! Environment variables are prefixed with `DICANCHOR_` and use double
//! underscores to separate nested levels:
//! - `DICANCHOR_ANNOTATE__HIGHLIGHT_MS=5000` sets `annotate.highlight_ms`
//! - `DICANCHOR_PATHS__INPUT=site/dic.html` sets `paths.input`
//! - `DICANCHOR_ANNOTATE__COLLISION=keep-first` sets `annotate.collision`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Directory holding the settings file.
pub const CONFIG_DIR: &str = ".dicanchor";
/// Settings file name inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "settings.toml";
/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "DICANCHOR_";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Default input and output locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Annotation behaviour
    #[serde(default)]
    pub annotate: AnnotateConfig,

    /// Term linker output
    #[serde(default)]
    pub link: LinkConfig,

    /// Log levels
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PathsConfig {
    /// Glossary page to read
    #[serde(default = "default_input")]
    pub input: PathBuf,

    /// Annotated page to write
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Term index JSON to write
    #[serde(default = "default_index")]
    pub index: PathBuf,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AnnotateConfig {
    /// Prefix namespacing every term identifier
    #[serde(default = "default_id_prefix")]
    pub id_prefix: String,

    /// Attribute carrying the identifier on each entry block
    #[serde(default = "default_id_attribute")]
    pub id_attribute: String,

    /// CSS selector matching one entry block
    #[serde(default = "default_block_selector")]
    pub block_selector: String,

    /// CSS selector matching the term text inside a block
    #[serde(default = "default_term_selector")]
    pub term_selector: String,

    /// Script comment before which the hash handler is inserted
    #[serde(default = "default_script_marker")]
    pub script_marker: String,

    /// Class applied to a block reached through a deep link
    #[serde(default = "default_highlight_class")]
    pub highlight_class: String,

    /// Milliseconds before the highlight is removed
    #[serde(default = "default_highlight_ms")]
    pub highlight_ms: u64,

    /// Line endings of the written page
    #[serde(default)]
    pub line_ending: LineEnding,

    /// What to do when two terms share an identifier
    #[serde(default)]
    pub collision: CollisionPolicy,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LinkConfig {
    /// Glossary page the generated links point to
    #[serde(default = "default_link_page")]
    pub page: String,

    /// Class on generated anchors
    #[serde(default = "default_link_class")]
    pub link_class: String,

    /// Prefix of the anchor title attribute
    #[serde(default = "default_title_prefix")]
    pub title_prefix: String,

    /// Extra tokens considered when growing a phrase match
    #[serde(default = "default_max_lookahead")]
    pub max_lookahead: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Default level: error, warn, info, debug, trace
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-target overrides, e.g. `"dicanchor::annotate" = "debug"`
    #[serde(default)]
    pub modules: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum LineEnding {
    #[default]
    Crlf,
    Lf,
}

/// Handling of two raw terms that normalize to the same identifier.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum CollisionPolicy {
    /// Later entry in document order replaces the index value
    #[default]
    Overwrite,
    /// First entry in document order is kept
    KeepFirst,
    /// Abort before anything is written
    Error,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_input() -> PathBuf {
    PathBuf::from("mahler-search-app/dic.html")
}
fn default_output() -> PathBuf {
    PathBuf::from("mahler-search-app/dic_experimental.html")
}
fn default_index() -> PathBuf {
    PathBuf::from("mahler-search-app/data/dic_terms_index.json")
}
fn default_id_prefix() -> String {
    "term-".to_string()
}
fn default_id_attribute() -> String {
    "data-term-id".to_string()
}
fn default_block_selector() -> String {
    "div.row".to_string()
}
fn default_term_selector() -> String {
    "div.row > div > span.german".to_string()
}
fn default_script_marker() -> String {
    "// 略記一覧へのリンク".to_string()
}
fn default_highlight_class() -> String {
    "highlight".to_string()
}
fn default_highlight_ms() -> u64 {
    3000
}
fn default_link_page() -> String {
    "dic_experimental.html".to_string()
}
fn default_link_class() -> String {
    "dic-link".to_string()
}
fn default_title_prefix() -> String {
    "用語集で確認: ".to_string()
}
fn default_max_lookahead() -> usize {
    8
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            paths: PathsConfig::default(),
            annotate: AnnotateConfig::default(),
            link: LinkConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input: default_input(),
            output: default_output(),
            index: default_index(),
        }
    }
}

impl Default for AnnotateConfig {
    fn default() -> Self {
        Self {
            id_prefix: default_id_prefix(),
            id_attribute: default_id_attribute(),
            block_selector: default_block_selector(),
            term_selector: default_term_selector(),
            script_marker: default_script_marker(),
            highlight_class: default_highlight_class(),
            highlight_ms: default_highlight_ms(),
            line_ending: LineEnding::default(),
            collision: CollisionPolicy::default(),
        }
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            page: default_link_page(),
            link_class: default_link_class(),
            title_prefix: default_title_prefix(),
            max_lookahead: default_max_lookahead(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources.
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join(CONFIG_FILE));
        Self::load_from(config_path)
    }

    /// Load configuration using a specific settings file.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            // Double underscore separates nested levels, single underscore stays
            .merge(Env::prefixed(ENV_PREFIX).map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()
            .map_err(Box::new)
    }

    /// Find `.dicanchor/settings.toml` from the current directory upward.
    pub fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(CONFIG_DIR);
            if config_dir.is_dir() {
                return Some(config_dir.join(CONFIG_FILE));
            }
        }

        None
    }

    /// Save current configuration to file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file in the current directory.
    pub fn init_config_file(force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = PathBuf::from(CONFIG_DIR).join(CONFIG_FILE);

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        Settings::default().save(&config_path)?;
        Ok(config_path)
    }
}
