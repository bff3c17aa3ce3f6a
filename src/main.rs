//! Binary entry point for access-settings.
//!
//! Loads the two source documents named by the configuration and runs one
//! command against them.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use access_settings::AccessConfig;
use access_settings::cli::{ApplyCommand, ExportCommand, InspectCommand, ViewCommand};
use access_settings::observability;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Access settings - edit user/group/report access documents.
#[derive(Parser)]
#[command(name = "access-settings")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Summarize the loaded users, reports and groups.
    Inspect,

    /// Print the projected lists as JSON.
    View {
        /// Group to select.
        #[arg(short, long)]
        group: Option<String>,

        /// User to focus for connection highlighting.
        #[arg(long)]
        focus_user: Option<String>,

        /// Report to focus for connection highlighting.
        #[arg(long)]
        focus_report: Option<String>,

        /// Search text for the groups list.
        #[arg(long)]
        search_groups: Option<String>,

        /// Search text for the users list.
        #[arg(long)]
        search_users: Option<String>,

        /// Search text for the reports list.
        #[arg(long)]
        search_reports: Option<String>,
    },

    /// Replay a JSON action script and export the result.
    Apply {
        /// Script file: a JSON array of actions.
        script: PathBuf,

        /// Output directory (default: configured export directory).
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Re-export the loaded documents unchanged.
    Export {
        /// Output directory (default: configured export directory).
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    if let Err(e) = observability::init_from_settings(&config.logging, cli.verbose) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run_command(cli.command, &config) {
        Ok(output) => {
            print!("{output}");
            ExitCode::SUCCESS
        },
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command and returns its output.
fn run_command(command: Commands, config: &AccessConfig) -> access_settings::Result<String> {
    match command {
        Commands::Inspect => InspectCommand::new().run(config),
        Commands::View {
            group,
            focus_user,
            focus_report,
            search_groups,
            search_users,
            search_reports,
        } => ViewCommand {
            group,
            focus_user,
            focus_report,
            search_groups,
            search_users,
            search_reports,
        }
        .run(config)
        .map(|json| format!("{json}\n")),
        Commands::Apply { script, out } => ApplyCommand::new(script, out).run(config),
        Commands::Export { out } => ExportCommand::new(out).run(config),
    }
}

/// Loads configuration from the given file, or defaults, then applies
/// environment overrides.
fn load_config(path: Option<&Path>) -> access_settings::Result<AccessConfig> {
    let config = match path {
        Some(path) => AccessConfig::load_from_file(path)?,
        None => AccessConfig::new(),
    };
    config.with_env_overrides()
}
