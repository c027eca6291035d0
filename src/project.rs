//! Projects and their notes.
//!
//! The structurally simple sibling of the calendar: a project is a named
//! container of free-text notes, with plain CRUD and no ordering or
//! recurrence machinery.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// A named container of notes, owned by one user's store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub notes: Vec<Note>,
    pub created_at_utc: i64,
}

/// A free-text note inside a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: u64,
    pub text: String,
    pub created_at_utc: i64,
}

impl Project {
    pub fn new(id: u64, name: &str) -> Self {
        Project {
            id,
            name: name.to_string(),
            notes: Vec::new(),
            created_at_utc: Utc::now().timestamp(),
        }
    }

    /// Next note id within this project.
    pub fn next_note_id(&self) -> u64 {
        self.notes.iter().map(|n| n.id).max().unwrap_or(0) + 1
    }
}

impl Note {
    pub fn new(id: u64, text: &str) -> Self {
        Note {
            id,
            text: text.to_string(),
            created_at_utc: Utc::now().timestamp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_ids_are_monotonic_per_project() {
        let mut p = Project::new(1, "house");
        assert_eq!(p.next_note_id(), 1);
        p.notes.push(Note::new(1, "first"));
        p.notes.push(Note::new(2, "second"));
        assert_eq!(p.next_note_id(), 3);
        p.notes.retain(|n| n.id != 1);
        // Gaps from deletion never reuse ids below the max.
        assert_eq!(p.next_note_id(), 3);
    }
}
