//! Command implementations for the CLI interface.
//!
//! Command handlers operate on the signed-in user's store. Mutations are
//! gated in `main`: with no session they are silently skipped before any
//! handler runs.

use clap::{CommandFactory, Subcommand};
use clap_complete::{generate, Shell};

use chrono::{Duration, Local, NaiveDate};

use crate::cli::Cli;
use crate::color::{day_styles, OccurrenceStyle};
use crate::error::{Error, Result};
use crate::occurrence::{occurrences_on_day, Role};
use crate::ordering;
use crate::store::{NewTask, Store};
use crate::task::TaskPatch;

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in as a user. Creates the user's database on first write.
    Login {
        /// User name; lowercased and sanitised for file naming.
        name: String,
    },

    /// Sign out of the current session.
    Logout,

    /// Show the signed-in user.
    Whoami,

    /// Add a new task due on a given day.
    Add {
        /// Short title for the task.
        title: String,
        /// Optional free-text notes.
        #[arg(long)]
        notes: Option<String>,
        /// Due date: YYYY-MM-DD, "today", "tomorrow", or "in Nd".
        #[arg(long, default_value = "today")]
        due: String,
        /// Lead-in start date; the task previews daily from here to the
        /// due date. Mutually exclusive with --repeat-weekly.
        #[arg(long, conflicts_with = "repeat_weekly")]
        start: Option<String>,
        /// Repeat weekly on the due date's weekday.
        #[arg(long)]
        repeat_weekly: bool,
        /// Inclusive end date for weekly repetition.
        #[arg(long, requires = "repeat_weekly")]
        repeat_until: Option<String>,
    },

    /// Show the resolved occurrences for a day (or a range of days).
    Agenda {
        /// Day to resolve; defaults to today.
        day: Option<String>,
        /// Number of consecutive days to show.
        #[arg(long, default_value_t = 1)]
        days: u32,
    },

    /// View a single task's full record.
    View {
        /// Task ID.
        id: u64,
    },

    /// Update fields on a task.
    Update {
        /// Task ID.
        id: u64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        /// Clear the notes field.
        #[arg(long)]
        clear_notes: bool,
        /// New due date. Appends to the end of the new day's list; use
        /// `move` to place it at a specific position instead.
        #[arg(long)]
        due: Option<String>,
        /// Set the lead-in start date (clears weekly repetition).
        #[arg(long)]
        start: Option<String>,
        /// Clear the lead-in start date.
        #[arg(long)]
        clear_start: bool,
        /// Turn weekly repetition on or off (on clears the start date).
        #[arg(long)]
        repeat_weekly: Option<bool>,
        /// Inclusive end date for weekly repetition.
        #[arg(long)]
        repeat_until: Option<String>,
        /// Remove the repetition end date (repeat forever).
        #[arg(long)]
        clear_repeat_until: bool,
    },

    /// Mark an occurrence complete.
    Complete {
        /// Task ID.
        id: u64,
        /// Occurrence date for lead-up/repeat days; omitting it marks
        /// the due-day occurrence.
        #[arg(long)]
        on: Option<String>,
    },

    /// Reopen an occurrence (mark it not complete).
    Reopen {
        /// Task ID.
        id: u64,
        /// Occurrence date; omitting it reopens the due-day occurrence.
        #[arg(long)]
        on: Option<String>,
    },

    /// Move a task to a new position within its due date's list.
    Reorder {
        /// Task ID.
        id: u64,
        /// Target position (0-based) in the day's list.
        to: usize,
    },

    /// Move a task to a different due date.
    Move {
        /// Task ID.
        id: u64,
        /// Destination due date.
        day: String,
        /// Position in the destination day's list; omitted appends.
        #[arg(long)]
        index: Option<usize>,
    },

    /// Delete a task permanently.
    Delete {
        /// Task ID.
        id: u64,
    },

    /// Manage projects and their notes.
    Project {
        #[command(subcommand)]
        action: ProjectAction,
    },

    /// Launch the scrolling calendar TUI.
    Cal,

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for.
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ProjectAction {
    /// Create a project.
    Add {
        /// Project name.
        name: String,
    },
    /// List projects and note counts.
    List,
    /// Rename a project.
    Rename {
        /// Project ID.
        id: u64,
        /// New name.
        name: String,
    },
    /// Delete a project and all its notes.
    Delete {
        /// Project ID.
        id: u64,
    },
    /// Append a note to a project.
    Note {
        /// Project ID.
        id: u64,
        /// Note text.
        text: String,
    },
    /// List a project's notes.
    Notes {
        /// Project ID.
        id: u64,
    },
    /// Delete a note from a project.
    RmNote {
        /// Project ID.
        id: u64,
        /// Note ID.
        note: u64,
    },
}

/// Parse a date argument: "today", "tomorrow", "in Nd", or YYYY-MM-DD.
pub fn parse_date_input(s: &str) -> Result<NaiveDate> {
    let s = s.trim().to_lowercase();
    let today = Local::now().date_naive();
    match s.as_str() {
        "today" => return Ok(today),
        "tomorrow" => return Ok(today + Duration::days(1)),
        "yesterday" => return Ok(today - Duration::days(1)),
        _ => {}
    }
    if let Some(rest) = s.strip_prefix("in ") {
        if let Some(nd) = rest.strip_suffix('d') {
            if let Ok(days) = nd.trim().parse::<i64>() {
                return Ok(today + Duration::days(days));
            }
        }
        if let Some(nw) = rest.strip_suffix('w') {
            if let Ok(weeks) = nw.trim().parse::<i64>() {
                return Ok(today + Duration::weeks(weeks));
            }
        }
    }
    NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|_| Error::InvalidDate(s))
}

fn parse_opt_date(s: &Option<String>) -> Result<Option<NaiveDate>> {
    s.as_ref().map(|s| parse_date_input(s)).transpose()
}

/// Format a due date relative to today ("today", "tomorrow", "in 3d",
/// "2d late").
pub fn format_due_relative(due: NaiveDate, today: NaiveDate) -> String {
    let days = (due - today).num_days();
    match days {
        0 => "today".into(),
        1 => "tomorrow".into(),
        d if d > 1 => format!("in {d}d"),
        d => format!("{}d late", -d),
    }
}

fn warn_degenerate_repeat(due: NaiveDate, until: Option<NaiveDate>) {
    if let Some(until) = until {
        if until < due {
            eprintln!(
                "Warning: repeat-until {until} is before the due date {due}; \
                 this task will never be visible on the calendar."
            );
        }
    }
}

pub fn cmd_add(
    store: &mut Store,
    title: String,
    notes: Option<String>,
    due: String,
    start: Option<String>,
    repeat_weekly: bool,
    repeat_until: Option<String>,
) -> Result<()> {
    let due = parse_date_input(&due)?;
    let start = parse_opt_date(&start)?;
    let repeat_until = parse_opt_date(&repeat_until)?;
    if repeat_weekly {
        warn_degenerate_repeat(due, repeat_until);
    }
    if let Some(start) = start {
        if start > due {
            eprintln!(
                "Warning: start date {start} is after the due date {due}; \
                 this task will only show on its due date."
            );
        }
    }
    let id = store.create_task(NewTask {
        title,
        notes,
        due_date: due,
        start_date: start,
        repeat_weekly,
        repeat_until,
    })?;
    println!("Added task {id} due {due}");
    Ok(())
}

pub fn cmd_agenda(store: &Store, day: Option<String>, days: u32) -> Result<()> {
    let today = Local::now().date_naive();
    let first = match day {
        Some(d) => parse_date_input(&d)?,
        None => today,
    };
    let snapshot = store.snapshot();
    for offset in 0..days.max(1) {
        let day = first + Duration::days(i64::from(offset));
        let occurrences = occurrences_on_day(&snapshot, day);
        let styles = day_styles(&occurrences, day);
        println!("{} ({})", day.format("%a %Y-%m-%d"), occurrences.len());
        for (occ, style) in occurrences.iter().zip(&styles) {
            let check = if occ.completed_on(day) { "x" } else { " " };
            let role = match occ.role {
                Role::DueDay => "due",
                Role::LeadUp => "lead-up",
                Role::RepeatOccurrence => "weekly",
            };
            println!(
                "  {} [{check}] {:<40} {role:<8} {}",
                swatch(style),
                occ.task.title,
                format_due_relative(occ.task.due_date, today),
            );
        }
    }
    Ok(())
}

// Truecolor bullet carrying the occurrence's border colour, so the CLI
// agenda shows the same differentiation the TUI does.
fn swatch(style: &OccurrenceStyle) -> String {
    match style.border() {
        ratatui::style::Color::Rgb(r, g, b) => {
            format!("\x1b[38;2;{r};{g};{b}m\u{25cf}\x1b[0m")
        }
        _ => "\u{25cf}".to_string(),
    }
}

pub fn cmd_view(store: &Store, id: u64) -> Result<()> {
    let task = store.get_task(id).ok_or(Error::TaskNotFound(id))?;
    println!("Task {}: {}", task.id, task.title);
    println!("  due:        {} (rank {})", task.due_date, task.order);
    if let Some(start) = task.start_date {
        println!("  start:      {start}");
    }
    if task.repeat_weekly {
        match task.repeat_until {
            Some(until) => println!("  repeats:    weekly until {until}"),
            None => println!("  repeats:    weekly"),
        }
    }
    println!("  completed:  {}", task.completed);
    if !task.daily_completed.is_empty() {
        let days: Vec<String> = task
            .daily_completed
            .iter()
            .filter(|&(_, &done)| done)
            .map(|(d, _)| d.to_string())
            .collect();
        println!("  done days:  {}", days.join(", "));
    }
    if let Some(ref notes) = task.notes {
        println!("  notes:      {notes}");
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn cmd_update(
    store: &mut Store,
    id: u64,
    title: Option<String>,
    notes: Option<String>,
    clear_notes: bool,
    due: Option<String>,
    start: Option<String>,
    clear_start: bool,
    repeat_weekly: Option<bool>,
    repeat_until: Option<String>,
    clear_repeat_until: bool,
) -> Result<()> {
    let patch = TaskPatch {
        title,
        notes,
        clear_notes,
        due_date: parse_opt_date(&due)?,
        start_date: parse_opt_date(&start)?,
        clear_start_date: clear_start,
        completed: None,
        repeat_weekly,
        repeat_until: parse_opt_date(&repeat_until)?,
        clear_repeat_until,
        daily_completed: Default::default(),
    };
    store.update_task(id, &patch)?;
    if let Some(task) = store.get_task(id) {
        if task.repeat_weekly {
            warn_degenerate_repeat(task.due_date, task.repeat_until);
        }
    }
    println!("Updated task {id}");
    Ok(())
}

fn completion_patch(store: &Store, id: u64, on: Option<String>, done: bool) -> Result<TaskPatch> {
    let task = store.get_task(id).ok_or(Error::TaskNotFound(id))?;
    let mut patch = TaskPatch::default();
    match on {
        Some(day) => {
            let day = parse_date_input(&day)?;
            if day == task.due_date {
                // The due-day state lives in the completed flag, never in
                // the per-date map.
                patch.completed = Some(done);
            } else {
                patch.daily_completed.insert(day, done);
            }
        }
        None => patch.completed = Some(done),
    }
    Ok(patch)
}

pub fn cmd_complete(store: &mut Store, id: u64, on: Option<String>) -> Result<()> {
    let patch = completion_patch(store, id, on, true)?;
    store.update_task(id, &patch)?;
    println!("Completed task {id}");
    Ok(())
}

pub fn cmd_reopen(store: &mut Store, id: u64, on: Option<String>) -> Result<()> {
    let patch = completion_patch(store, id, on, false)?;
    store.update_task(id, &patch)?;
    println!("Reopened task {id}");
    Ok(())
}

pub fn cmd_reorder(store: &mut Store, id: u64, to: usize) -> Result<()> {
    let snapshot = store.snapshot();
    let task = snapshot
        .iter()
        .find(|t| t.id == id)
        .ok_or(Error::TaskNotFound(id))?;
    let from = ordering::day_list(&snapshot, task.due_date)
        .iter()
        .position(|t| t.id == id)
        .ok_or(Error::TaskNotFound(id))?;
    let batch = ordering::reorder_within_day(&snapshot, id, from, to)?;
    store.apply_order_batch(&batch)?;
    println!("Moved task {id} to position {to}");
    Ok(())
}

pub fn cmd_move(store: &mut Store, id: u64, day: String, index: Option<usize>) -> Result<()> {
    let target = parse_date_input(&day)?;
    let snapshot = store.snapshot();
    let batch = match index {
        Some(index) => ordering::move_to_day(&snapshot, id, target, index)?,
        None => ordering::drop_on_day(&snapshot, id, target)?,
    };
    store.apply_order_batch(&batch)?;
    println!("Moved task {id} to {target}");
    Ok(())
}

pub fn cmd_delete(store: &mut Store, id: u64) -> Result<()> {
    store.delete_task(id)?;
    println!("Deleted task {id}");
    Ok(())
}

pub fn cmd_project(store: &mut Store, action: ProjectAction) -> Result<()> {
    match action {
        ProjectAction::Add { name } => {
            let id = store.create_project(&name)?;
            println!("Added project {id}: {name}");
        }
        ProjectAction::List => {
            for p in store.projects() {
                println!("{:<5} {:<30} {} notes", p.id, p.name, p.notes.len());
            }
        }
        ProjectAction::Rename { id, name } => {
            store.rename_project(id, &name)?;
            println!("Renamed project {id}");
        }
        ProjectAction::Delete { id } => {
            store.delete_project(id)?;
            println!("Deleted project {id}");
        }
        ProjectAction::Note { id, text } => {
            let note = store.add_note(id, &text)?;
            println!("Added note {note} to project {id}");
        }
        ProjectAction::Notes { id } => {
            let project = store.get_project(id).ok_or(Error::ProjectNotFound(id))?;
            for note in &project.notes {
                println!("{:<5} {}", note.id, note.text);
            }
        }
        ProjectAction::RmNote { id, note } => {
            store.delete_note(id, note)?;
            println!("Deleted note {note} from project {id}");
        }
    }
    Ok(())
}

pub fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "dp", &mut std::io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_date_literals() {
        let today = Local::now().date_naive();
        assert_eq!(parse_date_input("today").unwrap(), today);
        assert_eq!(
            parse_date_input("tomorrow").unwrap(),
            today + Duration::days(1)
        );
        assert_eq!(
            parse_date_input("in 3d").unwrap(),
            today + Duration::days(3)
        );
        assert_eq!(
            parse_date_input("in 2w").unwrap(),
            today + Duration::weeks(2)
        );
        assert_eq!(
            parse_date_input("2024-03-10").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
        );
        assert!(parse_date_input("next blursday").is_err());
    }

    #[test]
    fn relative_due_formatting() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let d = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
        assert_eq!(format_due_relative(d("2024-03-10"), today), "today");
        assert_eq!(format_due_relative(d("2024-03-11"), today), "tomorrow");
        assert_eq!(format_due_relative(d("2024-03-14"), today), "in 4d");
        assert_eq!(format_due_relative(d("2024-03-08"), today), "2d late");
    }
}
