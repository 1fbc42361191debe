//! Tessel schema tool.
//!
//! Usage:
//!   tessel check schema.json
//!   tessel validate schema.json graph.json
//!
//! Both commands print a report and exit with status 1 when the input is
//! rejected.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tessel_cli::{ValidateReport, check_file, validate_files};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "tessel")]
#[command(about = "Audit Tessel schemas and validate entity graphs")]
struct Args {
    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Report kinds that structurally imply one another
    Check {
        /// Schema file (JSON)
        schema: PathBuf,
    },
    /// Assign a kind to every entity of a graph
    Validate {
        /// Schema file (JSON)
        schema: PathBuf,
        /// Entity graph file (JSON object keyed by id)
        graph: PathBuf,
    },
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    match args.command {
        Command::Check { schema } => {
            info!("checking {}", schema.display());
            let report = check_file(&schema)?;
            print!("{}", report.render());
            Ok(exit_code(report.is_coherent()))
        }
        Command::Validate { schema, graph } => {
            info!("validating {} against {}", graph.display(), schema.display());
            let report: ValidateReport = validate_files(&schema, &graph)?;
            print!("{}", report.render());
            Ok(exit_code(report.is_valid()))
        }
    }
}

fn exit_code(ok: bool) -> ExitCode {
    if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}
