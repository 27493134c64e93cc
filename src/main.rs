use clap::{Parser, Subcommand};
use filify::cli::{Command, run_cli};
use filify::config::Config;
use filify::output::OutputFormatter;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "filify",
    version,
    about = "Organize files into category subfolders with commit-based undo"
)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory to operate on, overriding the configured target directory.
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Move files in the target directory into category subfolders.
    Organize {
        /// Report the planned moves without making changes.
        #[arg(long)]
        dry_run: bool,
    },
    /// Undo the last N recorded moves.
    UndoLast {
        /// Number of moves to reverse, most recent first.
        #[arg(value_parser = clap::value_parser!(u64).range(1..))]
        count: u64,
    },
    /// Undo every move recorded under one commit id.
    UndoCommit {
        /// Commit id printed by the organize run.
        commit_id: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            OutputFormatter::error(&e.to_string());
            return ExitCode::FAILURE;
        }
    };
    if let Some(dir) = cli.dir {
        config.target_directory = dir;
    }

    let command = match cli.command {
        Commands::Organize { dry_run } => Command::Organize { dry_run },
        Commands::UndoLast { count } => Command::UndoLast {
            count: count as usize,
        },
        Commands::UndoCommit { commit_id } => Command::UndoCommit { commit_id },
    };

    match run_cli(command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            OutputFormatter::error(&e);
            ExitCode::FAILURE
        }
    }
}
