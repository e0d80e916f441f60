//! Spelltree CLI - Command-line interface for Spelltree
//!
//! This is the main entry point for tree authors and tooling.
//! It provides commands for checking, repairing, enriching and exporting
//! spell trees.

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "spelltree")]
#[command(author = "Spelltree Contributors")]
#[command(version)]
#[command(about = "Prerequisite graph checks and repair for spell trees", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to spelltree.json next to the tree)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default spelltree.json
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Report orphans, missing prerequisites, unobtainable spells and cycles
    Check {
        /// Tree JSON file
        tree: PathBuf,

        /// Output as JSON instead of formatted text
        #[arg(long)]
        json: bool,
    },

    /// Repair the tree and write it back
    Repair {
        /// Tree JSON file
        tree: PathBuf,

        /// Output file (defaults to rewriting the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Report what would change without writing anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Add random extra prerequisites
    Inject {
        /// Tree JSON file
        tree: PathBuf,

        /// Per-node chance in percent (overrides config)
        #[arg(long)]
        chance: Option<u32>,

        /// Prerequisite cap per node (overrides config)
        #[arg(long)]
        max_prereqs: Option<usize>,

        /// Lowest tier that receives extra prerequisites (overrides config)
        #[arg(long)]
        min_tier: Option<u32>,

        /// Do not prefer candidates one tier below the target
        #[arg(long)]
        any_tier: bool,

        /// Seed for reproducible runs
        #[arg(long)]
        seed: Option<u64>,

        /// Output file (defaults to rewriting the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export the repaired graph to JSON
    Export {
        /// Tree JSON file
        tree: PathBuf,

        /// Output file
        #[arg(short, long, default_value = "spelltree-graph.json")]
        output: PathBuf,
    },

    /// Show graph statistics per school
    Status {
        /// Tree JSON file
        tree: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(tracing_subscriber::EnvFilter::new(filter))
        .init();

    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Init { path } => commands::init(&path),
        Commands::Check { tree, json } => commands::check(&tree, config, json),
        Commands::Repair {
            tree,
            output,
            dry_run,
        } => commands::repair(&tree, config, output.as_deref(), dry_run),
        Commands::Inject {
            tree,
            chance,
            max_prereqs,
            min_tier,
            any_tier,
            seed,
            output,
        } => {
            let overrides = commands::InjectOverrides {
                chance,
                max_prerequisites: max_prereqs,
                min_tier,
                any_tier,
            };
            commands::inject(&tree, config, &overrides, seed, output.as_deref())
        }
        Commands::Export { tree, output } => commands::export(&tree, config, &output),
        Commands::Status { tree } => commands::status(&tree, config),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}
