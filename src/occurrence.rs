//! Occurrence resolution: which tasks show up on which calendar day.
//!
//! A task produces at most one occurrence per day. Non-repeating tasks are
//! visible across their lead-up range `[start_date, due_date]` (just the
//! due date when no start date is set); weekly-repeating tasks are visible
//! on every date sharing the due date's weekday, from the due date up to
//! the inclusive `repeat_until` bound.

use chrono::{Datelike, NaiveDate};

use crate::task::Task;

/// How a task appears on a particular day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The authoritative occurrence on the task's due date.
    DueDay,
    /// A preview occurrence on a day before the due date.
    LeadUp,
    /// A weekly-repeat occurrence. The first occurrence on the due date
    /// itself is also a repeat occurrence, not a due-day one.
    RepeatOccurrence,
}

/// One day's visible representation of a task.
#[derive(Debug, Clone, Copy)]
pub struct Occurrence<'a> {
    pub task: &'a Task,
    pub role: Role,
}

impl Occurrence<'_> {
    /// Completion state of this specific occurrence. The due-day flag is
    /// authoritative on the due date; every other date reads the per-date
    /// map.
    pub fn completed_on(&self, day: NaiveDate) -> bool {
        match self.role {
            Role::DueDay => self.task.completed,
            Role::LeadUp => self.daily(day),
            // The first repeat occurrence falls on the due date, where the
            // map never holds a key.
            Role::RepeatOccurrence if day == self.task.due_date => self.task.completed,
            Role::RepeatOccurrence => self.daily(day),
        }
    }

    fn daily(&self, day: NaiveDate) -> bool {
        self.task.daily_completed.get(&day).copied().unwrap_or(false)
    }
}

/// Resolve a task's role on `day`, or `None` when it is invisible there.
pub fn role_on_day(task: &Task, day: NaiveDate) -> Option<Role> {
    if task.repeat_weekly {
        // A repeat_until before the due date leaves the task with no
        // visible occurrence anywhere, the due date included.
        let in_bound = task.repeat_until.map_or(true, |until| day <= until);
        if day >= task.due_date && in_bound && day.weekday() == task.due_date.weekday() {
            Some(Role::RepeatOccurrence)
        } else {
            None
        }
    } else {
        let first = task.start_date.unwrap_or(task.due_date);
        if first <= day && day <= task.due_date {
            if day == task.due_date {
                Some(Role::DueDay)
            } else {
                Some(Role::LeadUp)
            }
        } else {
            None
        }
    }
}

/// All occurrences visible on `day`, ordered by the owning task's
/// `(due_date, order)`.
///
/// Lead-up items interleave by their task's due date, not the displayed
/// day: a preview of a task due later sorts after a task due sooner even
/// when both appear on the same day.
pub fn occurrences_on_day(tasks: &[Task], day: NaiveDate) -> Vec<Occurrence<'_>> {
    let mut out: Vec<Occurrence<'_>> = tasks
        .iter()
        .filter_map(|task| role_on_day(task, day).map(|role| Occurrence { task, role }))
        .collect();
    out.sort_by_key(|o| (o.task.due_date, o.task.order));
    out
}
