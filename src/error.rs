//! Error types for dayplan.
//!
//! Failure policy: with no signed-in user the CLI skips task and project
//! commands silently before any handler runs (only `cal` reports the
//! missing session); title validation short-circuits before any write;
//! storage failures propagate to the command handler,
//! which prints the error and exits non-zero. There is no retry policy
//! and no rollback for multi-task order batches: the store applies a
//! batch in memory and saves the file once.

use thiserror::Error;

/// Main error type for dayplan operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("No user is signed in. Run `dp login <name>` first.")]
    Unauthenticated,

    #[error("Task title cannot be empty")]
    EmptyTitle,

    #[error("Task {0} not found")]
    TaskNotFound(u64),

    #[error("Project {0} not found")]
    ProjectNotFound(u64),

    #[error("Note {0} not found")]
    NoteNotFound(u64),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Index {index} out of range for {day} ({len} tasks)")]
    IndexOutOfRange {
        day: chrono::NaiveDate,
        index: usize,
        len: usize,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for dayplan operations.
pub type Result<T> = std::result::Result<T, Error>;
