//! Per-user document store backed by a JSON file.
//!
//! Stands in for the remote store collaborator: create/update/delete for
//! tasks and projects, order batches applied as one save, and change
//! listeners that receive the full `(due_date, order)`-sorted snapshot
//! after every successful write, playing the role of the original
//! design's live-subscription push channel on a single thread.
//!
//! Each user gets their own database file, named `<user>_tasks.json`
//! inside the data directory. Saves are atomic (temp file + rename), so
//! a multi-task order batch is either fully on disk or not at all.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::ordering::{drop_on_day, next_order, OrderBatch};
use crate::project::{Note, Project};
use crate::task::{Task, TaskPatch};

/// On-disk database shape: the user's tasks plus their projects.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Database {
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub projects: Vec<Project>,
}

impl Database {
    /// Load from JSON, starting fresh when the file is missing or
    /// unreadable.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Database::default();
        }
        let mut buf = String::new();
        match File::open(path).and_then(|mut f| f.read_to_string(&mut buf)) {
            Ok(_) => match serde_json::from_str(&buf) {
                Ok(db) => db,
                Err(e) => {
                    eprintln!("Error parsing DB, starting fresh: {e}");
                    Database::default()
                }
            },
            Err(e) => {
                eprintln!("Error reading DB, starting fresh: {e}");
                Database::default()
            }
        }
    }

    /// Save to JSON using an atomic write (temp file + rename).
    pub fn save(&self, path: &Path) -> Result<()> {
        let tmp = path.with_extension("json.tmp");
        let data = serde_json::to_string_pretty(self)?;
        let mut f = File::create(&tmp)?;
        f.write_all(data.as_bytes())?;
        f.flush()?;
        fs::rename(tmp, path)?;
        Ok(())
    }

    fn next_task_id(&self) -> u64 {
        self.tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1
    }

    fn next_project_id(&self) -> u64 {
        self.projects.iter().map(|p| p.id).max().unwrap_or(0) + 1
    }
}

/// Fields for a new task. The id, rank, and creation timestamp are
/// assigned by the store.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub notes: Option<String>,
    pub due_date: NaiveDate,
    pub start_date: Option<NaiveDate>,
    pub repeat_weekly: bool,
    pub repeat_until: Option<NaiveDate>,
}

type Listener = Box<dyn FnMut(&[Task])>;

/// A user's open store: database, file path, and snapshot listeners.
pub struct Store {
    db: Database,
    path: PathBuf,
    listeners: Vec<Listener>,
}

impl Store {
    /// Database file for `user` inside the data directory.
    pub fn file_for_user(data_dir: &Path, user: &str) -> PathBuf {
        data_dir.join(format!("{user}_tasks.json"))
    }

    /// Open (or initialize) the store for one user's namespace.
    pub fn open(data_dir: &Path, user: &str) -> Self {
        let path = Self::file_for_user(data_dir, user);
        Store {
            db: Database::load(&path),
            path,
            listeners: Vec::new(),
        }
    }

    /// Open a store on an explicit database file (the `--db` escape
    /// hatch).
    pub fn open_path(path: &Path) -> Self {
        Store {
            db: Database::load(path),
            path: path.to_path_buf(),
            listeners: Vec::new(),
        }
    }

    /// Register a listener; it is called with the full sorted snapshot
    /// after every successful write.
    pub fn subscribe(&mut self, listener: impl FnMut(&[Task]) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Reload from disk, as if a fresh snapshot arrived from the remote.
    pub fn refresh(&mut self) {
        self.db = Database::load(&self.path);
    }

    /// Full task snapshot ordered by `(due_date, order)`.
    pub fn snapshot(&self) -> Vec<Task> {
        let mut tasks = self.db.tasks.clone();
        tasks.sort_by_key(|t| (t.due_date, t.order));
        tasks
    }

    pub fn get_task(&self, id: u64) -> Option<&Task> {
        self.db.tasks.iter().find(|t| t.id == id)
    }

    pub fn projects(&self) -> &[Project] {
        &self.db.projects
    }

    pub fn get_project(&self, id: u64) -> Option<&Project> {
        self.db.projects.iter().find(|p| p.id == id)
    }

    fn commit(&mut self) -> Result<()> {
        self.db.save(&self.path)?;
        let snapshot = self.snapshot();
        for listener in &mut self.listeners {
            listener(&snapshot);
        }
        Ok(())
    }

    /// Create a task, appending it after the current last rank for its
    /// due date. Rejects empty or whitespace-only titles before writing.
    pub fn create_task(&mut self, new: NewTask) -> Result<u64> {
        if new.title.trim().is_empty() {
            return Err(Error::EmptyTitle);
        }
        let id = self.db.next_task_id();
        let mut task = Task {
            id,
            title: new.title,
            notes: new.notes,
            due_date: new.due_date,
            start_date: None,
            completed: false,
            order: next_order(&self.db.tasks, new.due_date),
            daily_completed: Default::default(),
            repeat_weekly: false,
            repeat_until: None,
            created_at_utc: Utc::now().timestamp(),
        };
        if new.repeat_weekly {
            task.set_repeat_weekly(true, new.repeat_until);
        } else {
            task.set_start_date(new.start_date);
        }
        debug!(id, due = %task.due_date, order = task.order, "create task");
        self.db.tasks.push(task);
        self.commit()?;
        Ok(id)
    }

    /// Merge a partial update into one task. A patch that changes the
    /// due date moves the task between day lists, so both days are
    /// re-indexed in the same save: the task appends to the new day and
    /// the old day's ranks close the gap.
    pub fn update_task(&mut self, id: u64, patch: &TaskPatch) -> Result<()> {
        let task = self
            .db
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(Error::TaskNotFound(id))?;
        let old_due = task.due_date;
        patch.apply(task);
        let new_due = task.due_date;
        if new_due != old_due {
            let batch = drop_on_day(&self.db.tasks, id, new_due)?;
            self.apply_writes(&batch);
        }
        debug!(id, "update task");
        self.commit()
    }

    /// Permanently delete a task. No tombstone.
    pub fn delete_task(&mut self, id: u64) -> Result<()> {
        let before = self.db.tasks.len();
        self.db.tasks.retain(|t| t.id != id);
        if self.db.tasks.len() == before {
            return Err(Error::TaskNotFound(id));
        }
        debug!(id, "delete task");
        self.commit()
    }

    fn apply_writes(&mut self, batch: &OrderBatch) {
        for write in batch {
            if let Some(task) = self.db.tasks.iter_mut().find(|t| t.id == write.id) {
                task.due_date = write.due_date;
                task.order = write.order;
            }
        }
    }

    /// Apply a whole ordering batch and save once, so the affected days'
    /// dense rank sequences change together.
    pub fn apply_order_batch(&mut self, batch: &OrderBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        for write in batch {
            if self.get_task(write.id).is_none() {
                return Err(Error::TaskNotFound(write.id));
            }
        }
        self.apply_writes(batch);
        debug!(writes = batch.len(), "apply order batch");
        self.commit()
    }

    /// Create a project with an empty note list.
    pub fn create_project(&mut self, name: &str) -> Result<u64> {
        if name.trim().is_empty() {
            return Err(Error::EmptyTitle);
        }
        let id = self.db.next_project_id();
        self.db.projects.push(Project::new(id, name));
        self.commit()?;
        Ok(id)
    }

    pub fn rename_project(&mut self, id: u64, name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(Error::EmptyTitle);
        }
        let project = self
            .db
            .projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(Error::ProjectNotFound(id))?;
        project.name = name.to_string();
        self.commit()
    }

    pub fn delete_project(&mut self, id: u64) -> Result<()> {
        let before = self.db.projects.len();
        self.db.projects.retain(|p| p.id != id);
        if self.db.projects.len() == before {
            return Err(Error::ProjectNotFound(id));
        }
        self.commit()
    }

    /// Append a note to a project, returning the note id.
    pub fn add_note(&mut self, project_id: u64, text: &str) -> Result<u64> {
        let project = self
            .db
            .projects
            .iter_mut()
            .find(|p| p.id == project_id)
            .ok_or(Error::ProjectNotFound(project_id))?;
        let id = project.next_note_id();
        project.notes.push(Note::new(id, text));
        self.commit()?;
        Ok(id)
    }

    pub fn delete_note(&mut self, project_id: u64, note_id: u64) -> Result<()> {
        let project = self
            .db
            .projects
            .iter_mut()
            .find(|p| p.id == project_id)
            .ok_or(Error::ProjectNotFound(project_id))?;
        let before = project.notes.len();
        project.notes.retain(|n| n.id != note_id);
        if project.notes.len() == before {
            return Err(Error::NoteNotFound(note_id));
        }
        self.commit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ordering;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn new_task(title: &str, due: &str) -> NewTask {
        NewTask {
            title: title.into(),
            notes: None,
            due_date: date(due),
            start_date: None,
            repeat_weekly: false,
            repeat_until: None,
        }
    }

    #[test]
    fn create_appends_after_existing_ranks() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Store::open(dir.path(), "alice");
        let a = store.create_task(new_task("a", "2024-03-10")).unwrap();
        let b = store.create_task(new_task("b", "2024-03-10")).unwrap();
        assert_eq!(store.get_task(a).unwrap().order, 0);
        assert_eq!(store.get_task(b).unwrap().order, 1);
    }

    #[test]
    fn empty_title_is_rejected_before_write() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Store::open(dir.path(), "alice");
        assert!(matches!(
            store.create_task(new_task("   ", "2024-03-10")),
            Err(Error::EmptyTitle)
        ));
        assert!(!Store::file_for_user(dir.path(), "alice").exists());
    }

    #[test]
    fn round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Store::open(dir.path(), "alice");
        let id = store
            .create_task(NewTask {
                start_date: Some(date("2024-03-05")),
                ..new_task("a", "2024-03-10")
            })
            .unwrap();

        let reopened = Store::open(dir.path(), "alice");
        let task = reopened.get_task(id).unwrap();
        assert_eq!(task.title, "a");
        assert_eq!(task.start_date, Some(date("2024-03-05")));
        assert!(!task.repeat_weekly);
    }

    #[test]
    fn users_get_separate_namespaces() {
        let dir = tempfile::tempdir().unwrap();
        let mut alice = Store::open(dir.path(), "alice");
        alice.create_task(new_task("a", "2024-03-10")).unwrap();
        let bob = Store::open(dir.path(), "bob");
        assert!(bob.snapshot().is_empty());
    }

    #[test]
    fn order_batch_applies_as_one_save() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Store::open(dir.path(), "alice");
        for t in ["a", "b", "c"] {
            store.create_task(new_task(t, "2024-03-10")).unwrap();
        }
        let snapshot = store.snapshot();
        let batch = ordering::reorder_within_day(&snapshot, 1, 0, 3).unwrap();
        store.apply_order_batch(&batch).unwrap();

        let reopened = Store::open(dir.path(), "alice");
        let orders: Vec<(u64, u32)> = reopened
            .snapshot()
            .iter()
            .filter(|t| t.due_date == date("2024-03-10"))
            .map(|t| (t.id, t.order))
            .collect();
        assert_eq!(orders, vec![(2, 0), (3, 1), (1, 2)]);
    }

    #[test]
    fn due_date_update_reindexes_both_days() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Store::open(dir.path(), "alice");
        let a = store.create_task(new_task("a", "2024-03-10")).unwrap();
        let b = store.create_task(new_task("b", "2024-03-10")).unwrap();
        let c = store.create_task(new_task("c", "2024-03-11")).unwrap();

        let patch = TaskPatch {
            due_date: Some(date("2024-03-11")),
            ..Default::default()
        };
        store.update_task(a, &patch).unwrap();

        let ranks = |day: &str| -> Vec<(u64, u32)> {
            ordering::day_list(&store.snapshot(), date(day))
                .iter()
                .map(|t| (t.id, t.order))
                .collect()
        };
        // The moved task appends to the new day; the old day closes up.
        assert_eq!(ranks("2024-03-11"), vec![(c, 0), (a, 1)]);
        assert_eq!(ranks("2024-03-10"), vec![(b, 0)]);

        // A later append on the origin day continues the dense sequence.
        let d = store.create_task(new_task("d", "2024-03-10")).unwrap();
        assert_eq!(store.get_task(d).unwrap().order, 1);
    }

    #[test]
    fn listeners_see_sorted_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Store::open(dir.path(), "alice");
        let seen: Rc<RefCell<Vec<Vec<u64>>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        store.subscribe(move |tasks| {
            sink.borrow_mut().push(tasks.iter().map(|t| t.id).collect());
        });

        store.create_task(new_task("later", "2024-03-12")).unwrap();
        store.create_task(new_task("sooner", "2024-03-10")).unwrap();

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        // Second snapshot sorted by due date: task 2 (sooner) first.
        assert_eq!(seen[1], vec![2, 1]);
    }

    #[test]
    fn project_notes_crud() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Store::open(dir.path(), "alice");
        let pid = store.create_project("Kitchen reno").unwrap();
        let nid = store.add_note(pid, "measure the bench").unwrap();
        assert_eq!(store.get_project(pid).unwrap().notes.len(), 1);

        store.rename_project(pid, "Kitchen renovation").unwrap();
        assert_eq!(store.get_project(pid).unwrap().name, "Kitchen renovation");

        store.delete_note(pid, nid).unwrap();
        assert!(store.get_project(pid).unwrap().notes.is_empty());

        store.delete_project(pid).unwrap();
        assert!(store.get_project(pid).is_none());
    }
}
