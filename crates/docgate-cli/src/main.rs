//! # docgate CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use docgate_cli::check::{run_check, CheckArgs};
use docgate_cli::inspect::{run_inspect, InspectArgs};
use docgate_cli::schemas::{run_schemas, SchemasArgs};

/// docgate: schema-versioned document validation.
///
/// Checks YAML and JSON documents against the schema name and version
/// range each one declares.
#[derive(Parser, Debug)]
#[command(name = "docgate", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit log lines as JSON.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Report the schema declaration of a single document.
    Inspect(InspectArgs),

    /// Validate documents against a schema registry.
    Check(CheckArgs),

    /// List the schemas a registry installs.
    Schemas(SchemasArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over -v.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "docgate CLI starting");

    let result = match cli.command {
        Commands::Inspect(args) => run_inspect(&args),
        Commands::Check(args) => run_check(&args),
        Commands::Schemas(args) => run_schemas(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
