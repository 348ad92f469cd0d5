//! Settings scaffolding: `dicanchor init` and `dicanchor config`.

use console::style;

use crate::config::Settings;

/// Write `.dicanchor/settings.toml` with the default paths and selectors.
pub fn run_init(force: bool) {
    let path = match Settings::init_config_file(force) {
        Ok(path) => path,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let defaults = Settings::default();
    println!("{} Created {}", style("✓").green().bold(), path.display());
    println!("  input   {}", defaults.paths.input.display());
    println!("  output  {}", defaults.paths.output.display());
    println!("  index   {}", defaults.paths.index.display());
    println!("Adjust [paths] and the [annotate] selectors, then run `dicanchor annotate`.");
}

/// Print the effective settings as TOML.
///
/// The output is a complete settings file and can be redirected into one.
pub fn run_config(settings: &Settings) {
    match toml::to_string_pretty(settings) {
        Ok(rendered) => print!("{rendered}"),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
