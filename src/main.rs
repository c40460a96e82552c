//! Entangled CLI - Literate Programming Engine

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use entangled_core::commands;
use entangled_core::config::{self, AnnotationMethod};
use entangled_core::interface::Context;
use entangled_core::Result;

#[derive(Parser)]
#[command(name = "entangled")]
#[command(author, version, about = "Literate programming engine", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Working directory
    #[arg(short = 'C', long, global = true)]
    directory: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract code from markdown files
    Tangle {
        /// Force overwrite even if files have been modified externally
        #[arg(short, long)]
        force: bool,

        /// Dry run - show what would be done without doing it
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Annotation method: standard, naked or bare
        #[arg(short, long)]
        annotation: Option<AnnotationMethod>,
    },

    /// Update markdown from modified code files
    Stitch {
        /// Write documents even if they changed while being stitched
        #[arg(short, long)]
        force: bool,

        /// Dry run - show what would be done without doing it
        #[arg(short = 'n', long)]
        dry_run: bool,
    },

    /// Stitch edited code files, then tangle
    Sync {
        /// Force overwrite even if files have been modified
        #[arg(short, long)]
        force: bool,

        /// Dry run - show what would be done without doing it
        #[arg(short = 'n', long)]
        dry_run: bool,
    },

    /// Watch for changes and sync automatically
    Watch {
        /// Debounce delay in milliseconds (defaults to the configured value)
        #[arg(short, long, default_value = "0")]
        debounce: u64,
    },

    /// Show status of files
    Status,

    /// Rebuild the file database without writing any file
    Reset {
        /// Only remove the database
        #[arg(long)]
        clear: bool,
    },
}

fn run(cli: Cli) -> Result<()> {
    let base_dir = match cli.directory {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    let config = match cli.config {
        Some(ref path) => config::read_config_file(path)?,
        None => config::read_config(&base_dir)?,
    };

    let mut ctx = Context::new(config, base_dir)?;

    match cli.command {
        Commands::Tangle {
            force,
            dry_run,
            annotation,
        } => commands::tangle(
            &mut ctx,
            commands::TangleOptions {
                force,
                dry_run,
                annotation,
            },
        ),
        Commands::Stitch { force, dry_run } => {
            commands::stitch(&mut ctx, commands::StitchOptions { force, dry_run })
        }
        Commands::Sync { force, dry_run } => {
            commands::sync(&mut ctx, commands::SyncOptions { force, dry_run })
        }
        Commands::Watch { debounce } => commands::watch(
            &mut ctx,
            commands::WatchOptions {
                debounce_ms: debounce,
            },
        ),
        Commands::Status => commands::status(
            &ctx,
            commands::StatusOptions {
                verbose: cli.verbose,
            },
        ),
        Commands::Reset { clear } => commands::reset(&mut ctx, commands::ResetOptions { clear }),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
