use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Calendar-first task organiser CLI.
/// Data lives under ~/.dayplan, one database file per signed-in user.
#[derive(Parser)]
#[command(name = "dp", version, about = "Personal task organiser with a calendar TUI")]
pub struct Cli {
    /// Data directory holding per-user databases and the session file.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Path to a specific JSON database file, bypassing the per-user
    /// naming.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}
