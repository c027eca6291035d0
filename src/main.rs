//! # dp - Dayplan CLI
//!
//! A personal task and project organiser built around a scrolling
//! calendar: tasks anchor on a due date, can preview across a lead-in
//! range or repeat weekly, and keep a stable per-day ordering.
//!
//! ## Key Features
//!
//! - **Calendar-first**: an endless forward-scrolling day feed in the
//!   terminal, with per-task colours that sharpen as due dates approach
//! - **Lead-ups and repeats**: preview a task daily from its start date,
//!   or repeat it weekly until an end date
//! - **Stable day ordering**: tasks on a day keep a dense, drag-style
//!   ordering that survives moves between days
//! - **Projects with notes**: lightweight named note containers beside
//!   the calendar
//! - **Per-user storage**: one JSON database file per signed-in user
//!
//! ## Quick Start
//!
//! ```bash
//! # Sign in (creates ~/.dayplan on first use)
//! dp login alice
//!
//! # Add tasks
//! dp add "File tax return" --due 2024-06-30 --start 2024-06-20
//! dp add "Water the plants" --due today --repeat-weekly
//!
//! # See a week at a glance
//! dp agenda today --days 7
//!
//! # Launch the calendar TUI
//! dp cal
//! ```
//!
//! Data is stored locally in `~/.dayplan/` with one `<user>_tasks.json`
//! file per user plus a `session.json` holding the signed-in user. We
//! recommend you source control this folder via `git init` and back it
//! up periodically.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

pub mod auth;
pub mod cli;
pub mod cmd;
pub mod color;
pub mod error;
pub mod feed;
pub mod occurrence;
pub mod ordering;
pub mod project;
pub mod store;
pub mod task;
pub mod tui {
    pub mod app;
    pub mod colors;
    pub mod input;
    pub mod run;
}

use cli::Cli;
use cmd::Commands;
use error::Error;
use store::Store;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Determine the data directory
    let data_dir = cli.data_dir.clone().unwrap_or_else(|| {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".dayplan")
    });
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        eprintln!("Failed to create data directory {}: {}", data_dir.display(), e);
        std::process::exit(1);
    }

    // Session commands don't need a store
    match &cli.command {
        Commands::Login { name } => {
            match auth::login(&data_dir, name) {
                Ok(user) => println!("Signed in as {user}"),
                Err(_) => {
                    eprintln!("User name cannot be empty");
                    std::process::exit(1);
                }
            }
            return;
        }
        Commands::Logout => {
            if let Err(e) = auth::logout(&data_dir) {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
            println!("Signed out");
            return;
        }
        Commands::Whoami => {
            match auth::current_user(&data_dir) {
                Some(user) => println!("{user}"),
                None => println!("not signed in"),
            }
            return;
        }
        Commands::Completions { shell } => {
            cmd::cmd_completions(*shell);
            return;
        }
        _ => {}
    }

    // Everything else acts on a user's store. With no session, task
    // operations are no-ops: mutations are skipped silently, only the
    // TUI surfaces the missing session.
    let store = match cli.db.as_ref() {
        Some(path) => Some(Store::open_path(path)),
        None => auth::current_user(&data_dir).map(|user| Store::open(&data_dir, &user)),
    };
    let Some(mut store) = store else {
        if matches!(cli.command, Commands::Cal) {
            eprintln!("{}", Error::Unauthenticated);
            std::process::exit(1);
        }
        return;
    };

    let result = match cli.command {
        Commands::Login { .. }
        | Commands::Logout
        | Commands::Whoami
        | Commands::Completions { .. } => unreachable!("session commands handled above"),

        Commands::Add {
            title,
            notes,
            due,
            start,
            repeat_weekly,
            repeat_until,
        } => cmd::cmd_add(&mut store, title, notes, due, start, repeat_weekly, repeat_until),

        Commands::Agenda { day, days } => cmd::cmd_agenda(&store, day, days),

        Commands::View { id } => cmd::cmd_view(&store, id),

        Commands::Update {
            id,
            title,
            notes,
            clear_notes,
            due,
            start,
            clear_start,
            repeat_weekly,
            repeat_until,
            clear_repeat_until,
        } => cmd::cmd_update(
            &mut store,
            id,
            title,
            notes,
            clear_notes,
            due,
            start,
            clear_start,
            repeat_weekly,
            repeat_until,
            clear_repeat_until,
        ),

        Commands::Complete { id, on } => cmd::cmd_complete(&mut store, id, on),

        Commands::Reopen { id, on } => cmd::cmd_reopen(&mut store, id, on),

        Commands::Reorder { id, to } => cmd::cmd_reorder(&mut store, id, to),

        Commands::Move { id, day, index } => cmd::cmd_move(&mut store, id, day, index),

        Commands::Delete { id } => cmd::cmd_delete(&mut store, id),

        Commands::Project { action } => cmd::cmd_project(&mut store, action),

        Commands::Cal => tui::run::run_calendar(store),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
