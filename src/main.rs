use clap::Parser;

use dicanchor::Settings;
use dicanchor::cli::commands::annotate::AnnotateArgs;
use dicanchor::cli::{Cli, Commands, commands};

fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => {
            if !path.exists() {
                eprintln!("Configuration file not found: {}", path.display());
                std::process::exit(1);
            }
            Settings::load_from(path)
        }
        None => Settings::load(),
    };

    let settings = loaded.unwrap_or_else(|e| {
        eprintln!("Configuration error: {e}");
        eprintln!("Using default configuration for now.");
        Settings::default()
    });

    dicanchor::logging::init_with_config(&settings.logging);

    if cli.info {
        let source = cli
            .config
            .clone()
            .or_else(Settings::find_workspace_config)
            .filter(|path| path.exists());
        match source {
            Some(path) => eprintln!("Loaded configuration from {}", path.display()),
            None => eprintln!("No settings file found, using defaults"),
        }
    }

    match cli.command {
        Commands::Init { force } => commands::init::run_init(force),
        Commands::Config => commands::init::run_config(&settings),
        Commands::Annotate {
            input,
            output,
            index,
            collision,
            line_ending,
            dry_run,
        } => commands::annotate::run(
            AnnotateArgs {
                input,
                output,
                index,
                collision,
                line_ending,
                dry_run,
            },
            &settings,
        ),
        Commands::Normalize { terms, json } => commands::normalize::run(&terms, json, &settings),
        Commands::Link { index, page, text } => commands::link::run(index, page, &text, &settings),
    }
}
