//! Task data structure and partial-update support.
//!
//! This module defines the core `Task` struct for calendar tasks. A task is
//! anchored on its `due_date` and may additionally carry either a lead-in
//! `start_date` (previewed daily up to the due date) or weekly repetition,
//! never both at once.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A calendar task anchored on its due date.
///
/// `order` ranks the task among tasks sharing the same `due_date`; the
/// ordering engine keeps those ranks a dense 0..n-1 sequence per day.
/// Completion on the due day lives in `completed`; completion of lead-up
/// and repeat occurrences is tracked per date in `daily_completed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub title: String,
    pub notes: Option<String>,
    pub due_date: NaiveDate,
    pub start_date: Option<NaiveDate>,
    pub completed: bool,
    pub order: u32,
    #[serde(default)]
    pub daily_completed: BTreeMap<NaiveDate, bool>,
    #[serde(default)]
    pub repeat_weekly: bool,
    pub repeat_until: Option<NaiveDate>,
    pub created_at_utc: i64,
}

impl Task {
    /// Set a lead-in start date. Clears any weekly repetition: a task is
    /// either a lead-up task or a repeating task, never both.
    pub fn set_start_date(&mut self, start: Option<NaiveDate>) {
        self.start_date = start;
        if start.is_some() {
            self.repeat_weekly = false;
            self.repeat_until = None;
        }
    }

    /// Enable or disable weekly repetition. Enabling clears the start date.
    pub fn set_repeat_weekly(&mut self, repeat: bool, until: Option<NaiveDate>) {
        self.repeat_weekly = repeat;
        self.repeat_until = if repeat { until } else { None };
        if repeat {
            self.start_date = None;
        }
    }
}

/// A partial update to a single task.
///
/// Mirrors the store's merge semantics: `None` leaves a field unchanged,
/// `Some` replaces it, and the `clear_*` flags distinguish "unset this
/// optional field" from "leave it alone". `daily_completed` entries are
/// merged key-by-key rather than replacing the whole map, so marking one
/// occurrence date never rewrites the others.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub notes: Option<String>,
    pub clear_notes: bool,
    pub due_date: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub clear_start_date: bool,
    pub completed: Option<bool>,
    pub repeat_weekly: Option<bool>,
    pub repeat_until: Option<NaiveDate>,
    pub clear_repeat_until: bool,
    pub daily_completed: BTreeMap<NaiveDate, bool>,
}

impl TaskPatch {
    /// Apply this patch to a task, preserving the start-date/repeat
    /// mutual-exclusivity invariant regardless of which fields are set.
    pub fn apply(&self, task: &mut Task) {
        if let Some(ref title) = self.title {
            task.title = title.clone();
        }
        if self.clear_notes {
            task.notes = None;
        } else if let Some(ref notes) = self.notes {
            task.notes = Some(notes.clone());
        }
        if let Some(due) = self.due_date {
            task.due_date = due;
        }
        if self.clear_start_date {
            task.set_start_date(None);
        } else if let Some(start) = self.start_date {
            task.set_start_date(Some(start));
        }
        if let Some(repeat) = self.repeat_weekly {
            let until = if repeat {
                self.repeat_until.or(task.repeat_until)
            } else {
                None
            };
            task.set_repeat_weekly(repeat, until);
        } else if task.repeat_weekly {
            if self.clear_repeat_until {
                task.repeat_until = None;
            } else if let Some(until) = self.repeat_until {
                task.repeat_until = Some(until);
            }
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
        for (&date, &done) in &self.daily_completed {
            task.daily_completed.insert(date, done);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn task() -> Task {
        Task {
            id: 1,
            title: "t".into(),
            notes: None,
            due_date: date("2024-03-10"),
            start_date: None,
            completed: false,
            order: 0,
            daily_completed: BTreeMap::new(),
            repeat_weekly: false,
            repeat_until: None,
            created_at_utc: 0,
        }
    }

    #[test]
    fn start_date_clears_repeat() {
        let mut t = task();
        t.set_repeat_weekly(true, Some(date("2024-04-01")));
        assert!(t.repeat_weekly);

        t.set_start_date(Some(date("2024-03-01")));
        assert!(!t.repeat_weekly);
        assert_eq!(t.repeat_until, None);
        assert_eq!(t.start_date, Some(date("2024-03-01")));
    }

    #[test]
    fn repeat_clears_start_date() {
        let mut t = task();
        t.set_start_date(Some(date("2024-03-01")));

        t.set_repeat_weekly(true, None);
        assert_eq!(t.start_date, None);
        assert!(t.repeat_weekly);
    }

    #[test]
    fn patch_preserves_exclusivity() {
        let mut t = task();
        t.set_start_date(Some(date("2024-03-01")));

        let patch = TaskPatch {
            repeat_weekly: Some(true),
            repeat_until: Some(date("2024-05-01")),
            ..Default::default()
        };
        patch.apply(&mut t);
        assert_eq!(t.start_date, None);
        assert!(t.repeat_weekly);
        assert_eq!(t.repeat_until, Some(date("2024-05-01")));
    }

    #[test]
    fn patch_merges_daily_completed_keys() {
        let mut t = task();
        t.daily_completed.insert(date("2024-03-05"), true);

        let mut patch = TaskPatch::default();
        patch.daily_completed.insert(date("2024-03-06"), true);
        patch.apply(&mut t);

        assert_eq!(t.daily_completed.get(&date("2024-03-05")), Some(&true));
        assert_eq!(t.daily_completed.get(&date("2024-03-06")), Some(&true));
    }

    #[test]
    fn patch_clear_flags() {
        let mut t = task();
        t.notes = Some("n".into());
        t.set_start_date(Some(date("2024-03-01")));

        let patch = TaskPatch {
            clear_notes: true,
            clear_start_date: true,
            ..Default::default()
        };
        patch.apply(&mut t);
        assert_eq!(t.notes, None);
        assert_eq!(t.start_date, None);
    }
}
