//! Annotate command.

use std::path::PathBuf;

use console::style;

use crate::annotate::{AnnotatePaths, Annotator};
use crate::config::{CollisionPolicy, LineEnding, Settings};

/// Per-invocation overrides from the command line.
#[derive(Debug, Default)]
pub struct AnnotateArgs {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub index: Option<PathBuf>,
    pub collision: Option<CollisionPolicy>,
    pub line_ending: Option<LineEnding>,
    pub dry_run: bool,
}

/// Run annotate command.
pub fn run(args: AnnotateArgs, settings: &Settings) {
    let mut config = settings.annotate.clone();
    if let Some(policy) = args.collision {
        config.collision = policy;
    }
    if let Some(ending) = args.line_ending {
        config.line_ending = ending;
    }

    let paths = AnnotatePaths {
        input: args.input.unwrap_or_else(|| settings.paths.input.clone()),
        output: args.output.unwrap_or_else(|| settings.paths.output.clone()),
        index: args.index.unwrap_or_else(|| settings.paths.index.clone()),
    };

    let result = Annotator::new(config).and_then(|annotator| annotator.run(&paths, args.dry_run));

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(e.exit_code());
        }
    };

    let tick = style("✓").green().bold();
    if args.dry_run {
        println!(
            "Dry run: {} blocks, {} to annotate, {} already tagged, {} skipped",
            report.blocks, report.annotated, report.already_tagged, report.skipped
        );
        println!("Would write {} and {}", paths.output.display(), paths.index.display());
    } else {
        println!("{tick} Created {}", paths.output.display());
        println!(
            "{tick} Created {} ({} terms)",
            paths.index.display(),
            report.indexed_terms
        );
    }

    if !report.collisions.is_empty() {
        println!(
            "{} {} terms share an identifier with an earlier entry",
            style("!").yellow().bold(),
            report.collisions.len()
        );
        for collision in &report.collisions {
            println!(
                "  {}: '{}' / '{}' -> {}",
                collision.key, collision.first_term, collision.second_term, collision.resolved_id
            );
        }
    }
}
