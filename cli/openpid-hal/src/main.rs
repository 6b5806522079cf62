//! openpid-hal: generate embedded-hal drivers from openPID peripheral descriptions.

mod commands;
mod scaffold;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "openpid-hal",
    version,
    about = "Generate embedded-hal drivers from openPID peripheral descriptions"
)]
struct Cli {
    /// Log every pipeline stage (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a no_std driver crate
    Generate {
        /// openPID description (.toml)
        description: PathBuf,
        /// Output directory for the generated crate
        #[arg(long)]
        out: PathBuf,
        /// Generator configuration (.toml)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Additional capability contracts (.toml), may be repeated
        #[arg(long = "contracts")]
        contracts: Vec<PathBuf>,
        /// Overwrite a non-empty output directory
        #[arg(long)]
        force: bool,
    },
    /// Run the generator and print the emission report without writing files
    Check {
        /// openPID description (.toml)
        description: PathBuf,
        /// Generator configuration (.toml)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Additional capability contracts (.toml), may be repeated
        #[arg(long = "contracts")]
        contracts: Vec<PathBuf>,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the capability contracts
    Contracts {
        /// Additional capability contracts (.toml), may be repeated
        #[arg(long = "contracts")]
        contracts: Vec<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    setup_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn setup_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let filter = EnvFilter::from_default_env().add_directive(level.into());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Generate {
            description,
            out,
            config,
            contracts,
            force,
        } => commands::generate::run(&description, &out, config.as_deref(), &contracts, force),

        Commands::Check {
            description,
            config,
            contracts,
            json,
        } => commands::check::run(&description, config.as_deref(), &contracts, json),

        Commands::Contracts { contracts } => commands::contracts::run(&contracts),
    }
}
