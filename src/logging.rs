//! Diagnostics on stderr.
//!
//! stdout carries command output (`dicanchor link` prints HTML, `dicanchor
//! config` prints TOML), so every log line goes to stderr. Events carry a
//! `[component]` tag of their own and the tracing target is not printed.
//!
//! ```toml
//! [logging]
//! default = "warn"
//!
//! [logging.modules]
//! "dicanchor::annotate" = "debug"
//! ```
//!
//! A set `RUST_LOG` replaces the configured directives entirely, e.g.
//! `RUST_LOG=dicanchor::annotate=trace dicanchor annotate --dry-run`.

use std::sync::Once;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;

use crate::config::LoggingConfig;

static INIT: Once = Once::new();

/// `HH:MM:SS.mmm` in local time.
struct CompactTime;

impl FormatTime for CompactTime {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%H:%M:%S%.3f"))
    }
}

/// `default` followed by one `module=level` directive per configured module.
fn filter_directives(config: &LoggingConfig) -> String {
    std::iter::once(config.default.clone())
        .chain(
            config
                .modules
                .iter()
                .map(|(module, level)| format!("{module}={level}")),
        )
        .collect::<Vec<_>>()
        .join(",")
}

fn build_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_directives(config)))
}

/// Install the subscriber. Later calls are no-ops.
pub fn init_with_config(config: &LoggingConfig) {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(build_filter(config))
            .with_writer(std::io::stderr)
            .with_timer(CompactTime)
            .with_target(false)
            .try_init();
    });
}

/// Install the subscriber with the default `warn` level.
pub fn init() {
    init_with_config(&LoggingConfig::default());
}

/// Info event tagged with its component.
///
/// ```ignore
/// log_event!("annotate", "scanned", "{} blocks", count);
/// ```
#[macro_export]
macro_rules! log_event {
    ($component:expr, $event:expr) => {
        tracing::info!("[{}] {}", $component, $event)
    };
    ($component:expr, $event:expr, $($arg:tt)*) => {
        tracing::info!("[{}] {}: {}", $component, $event, format!($($arg)*))
    };
}

/// Debug event tagged with its component.
#[macro_export]
macro_rules! debug_event {
    ($component:expr, $event:expr) => {
        tracing::debug!("[{}] {}", $component, $event)
    };
    ($component:expr, $event:expr, $($arg:tt)*) => {
        tracing::debug!("[{}] {}: {}", $component, $event, format!($($arg)*))
    };
}
