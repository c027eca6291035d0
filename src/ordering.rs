//! Ordering engine: dense per-day ranks under reorder and move.
//!
//! Tasks sharing a due date carry `order` values forming a contiguous
//! 0..n-1 sequence. Every operation here is a pure function from an
//! immutable snapshot to a write batch; the store applies a batch in one
//! save so the affected days' ranks change together. The functions never
//! mutate the snapshot they read.

use chrono::NaiveDate;

use crate::error::{Error, Result};
use crate::task::Task;

/// One pending write: the task's (possibly new) due date and its new rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderWrite {
    pub id: u64,
    pub due_date: NaiveDate,
    pub order: u32,
}

/// A batch of order writes applied by the store as a single save.
pub type OrderBatch = Vec<OrderWrite>;

/// Tasks due on `day`, sorted by rank. Borrowed from the snapshot.
pub fn day_list<'a>(tasks: &'a [Task], day: NaiveDate) -> Vec<&'a Task> {
    let mut list: Vec<&Task> = tasks.iter().filter(|t| t.due_date == day).collect();
    list.sort_by_key(|t| t.order);
    list
}

/// Rank for a task appended to `day`: the count of tasks already there.
pub fn next_order(tasks: &[Task], day: NaiveDate) -> u32 {
    tasks.iter().filter(|t| t.due_date == day).count() as u32
}

fn reindex(ids: &[u64], day: NaiveDate) -> OrderBatch {
    ids.iter()
        .enumerate()
        .map(|(i, &id)| OrderWrite {
            id,
            due_date: day,
            order: i as u32,
        })
        .collect()
}

/// Move a task to a new position within its own due date's list.
///
/// When dragging downwards (`to_index > from_index`) the removal of the
/// source element shifts later indices down by one, so the task is
/// reinserted at `to_index - 1`; dragging upwards inserts exactly at
/// `to_index`. This makes "drop after item N" land identically in both
/// drag directions. Equal indices are a no-op (empty batch).
pub fn reorder_within_day(
    tasks: &[Task],
    task_id: u64,
    from_index: usize,
    to_index: usize,
) -> Result<OrderBatch> {
    let task = tasks
        .iter()
        .find(|t| t.id == task_id)
        .ok_or(Error::TaskNotFound(task_id))?;
    let day = task.due_date;
    let list = day_list(tasks, day);
    if from_index >= list.len() || list[from_index].id != task_id {
        return Err(Error::IndexOutOfRange {
            day,
            index: from_index,
            len: list.len(),
        });
    }
    if to_index == from_index {
        return Ok(Vec::new());
    }

    let mut ids: Vec<u64> = list.iter().map(|t| t.id).collect();
    ids.remove(from_index);
    let insert_at = if to_index > from_index {
        to_index - 1
    } else {
        to_index
    }
    .min(ids.len());
    ids.insert(insert_at, task_id);

    Ok(reindex(&ids, day))
}

/// Move a task to `target_due`, inserting at `target_index` in the
/// destination list (appending when the index is past the end).
///
/// The batch covers both days: the origin list re-indexed without the
/// task, and the destination list re-indexed with it. The moved task's
/// write carries the new due date.
pub fn move_to_day(
    tasks: &[Task],
    task_id: u64,
    target_due: NaiveDate,
    target_index: usize,
) -> Result<OrderBatch> {
    let task = tasks
        .iter()
        .find(|t| t.id == task_id)
        .ok_or(Error::TaskNotFound(task_id))?;
    let origin_due = task.due_date;

    let origin_ids: Vec<u64> = day_list(tasks, origin_due)
        .iter()
        .map(|t| t.id)
        .filter(|&id| id != task_id)
        .collect();
    let mut dest_ids: Vec<u64> = day_list(tasks, target_due)
        .iter()
        .map(|t| t.id)
        .filter(|&id| id != task_id)
        .collect();
    dest_ids.insert(target_index.min(dest_ids.len()), task_id);

    let mut batch = reindex(&dest_ids, target_due);
    if origin_due != target_due {
        batch.extend(reindex(&origin_ids, origin_due));
    }
    Ok(batch)
}

/// Drop a task onto a day container rather than a specific slot: append
/// to the end of the destination list.
pub fn drop_on_day(tasks: &[Task], task_id: u64, target_due: NaiveDate) -> Result<OrderBatch> {
    let len = tasks
        .iter()
        .filter(|t| t.due_date == target_due && t.id != task_id)
        .count();
    move_to_day(tasks, task_id, target_due, len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn task(id: u64, due: &str, order: u32) -> Task {
        Task {
            id,
            title: format!("task {id}"),
            notes: None,
            due_date: date(due),
            start_date: None,
            completed: false,
            order,
            daily_completed: BTreeMap::new(),
            repeat_weekly: false,
            repeat_until: None,
            created_at_utc: 0,
        }
    }

    fn apply(tasks: &mut [Task], batch: &OrderBatch) {
        for write in batch {
            let t = tasks.iter_mut().find(|t| t.id == write.id).unwrap();
            t.due_date = write.due_date;
            t.order = write.order;
        }
    }

    fn ranks(tasks: &[Task], day: &str) -> Vec<(u64, u32)> {
        day_list(tasks, date(day))
            .iter()
            .map(|t| (t.id, t.order))
            .collect()
    }

    fn assert_dense(tasks: &[Task], day: &str) {
        let orders: Vec<u32> = ranks(tasks, day).iter().map(|&(_, o)| o).collect();
        let expected: Vec<u32> = (0..orders.len() as u32).collect();
        assert_eq!(orders, expected, "day {day} ranks not dense");
    }

    #[test]
    fn drag_down_adjusts_target_index() {
        // Dragging index 0 to target 3 over four tasks lands it at
        // index 2, not 3.
        let mut tasks = vec![
            task(1, "2024-03-10", 0),
            task(2, "2024-03-10", 1),
            task(3, "2024-03-10", 2),
            task(4, "2024-03-10", 3),
        ];
        let batch = reorder_within_day(&tasks, 1, 0, 3).unwrap();
        apply(&mut tasks, &batch);
        assert_eq!(ranks(&tasks, "2024-03-10"), vec![(2, 0), (3, 1), (1, 2), (4, 3)]);
    }

    #[test]
    fn drag_up_inserts_exactly_at_target() {
        let mut tasks = vec![
            task(1, "2024-03-10", 0),
            task(2, "2024-03-10", 1),
            task(3, "2024-03-10", 2),
        ];
        let batch = reorder_within_day(&tasks, 3, 2, 0).unwrap();
        apply(&mut tasks, &batch);
        assert_eq!(ranks(&tasks, "2024-03-10"), vec![(3, 0), (1, 1), (2, 2)]);
    }

    #[test]
    fn reorder_same_index_is_noop() {
        let tasks = vec![task(1, "2024-03-10", 0), task(2, "2024-03-10", 1)];
        let batch = reorder_within_day(&tasks, 2, 1, 1).unwrap();
        assert!(batch.is_empty());
    }

    #[test]
    fn reorder_rejects_stale_index() {
        let tasks = vec![task(1, "2024-03-10", 0)];
        assert!(matches!(
            reorder_within_day(&tasks, 1, 3, 0),
            Err(Error::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn move_reindexes_both_days() {
        let mut tasks = vec![
            task(1, "2024-03-10", 0),
            task(2, "2024-03-10", 1),
            task(3, "2024-03-10", 2),
            task(4, "2024-03-11", 0),
            task(5, "2024-03-11", 1),
        ];
        let batch = move_to_day(&tasks, 2, date("2024-03-11"), 1).unwrap();
        apply(&mut tasks, &batch);
        assert_eq!(ranks(&tasks, "2024-03-10"), vec![(1, 0), (3, 1)]);
        assert_eq!(ranks(&tasks, "2024-03-11"), vec![(4, 0), (2, 1), (5, 2)]);
        assert_dense(&tasks, "2024-03-10");
        assert_dense(&tasks, "2024-03-11");
    }

    #[test]
    fn move_past_end_appends() {
        let mut tasks = vec![task(1, "2024-03-10", 0), task(2, "2024-03-11", 0)];
        let batch = move_to_day(&tasks, 1, date("2024-03-11"), 99).unwrap();
        apply(&mut tasks, &batch);
        assert_eq!(ranks(&tasks, "2024-03-11"), vec![(2, 0), (1, 1)]);
    }

    #[test]
    fn drop_on_day_appends_and_is_idempotent_in_shape() {
        let mut tasks = vec![
            task(1, "2024-03-10", 0),
            task(2, "2024-03-11", 0),
            task(3, "2024-03-11", 1),
        ];
        let batch = drop_on_day(&tasks, 1, date("2024-03-11")).unwrap();
        apply(&mut tasks, &batch);
        assert_eq!(ranks(&tasks, "2024-03-11"), vec![(2, 0), (3, 1), (1, 2)]);

        // Dropping again on the same day keeps the dense sequence.
        let batch = drop_on_day(&tasks, 1, date("2024-03-11")).unwrap();
        apply(&mut tasks, &batch);
        assert_eq!(ranks(&tasks, "2024-03-11"), vec![(2, 0), (3, 1), (1, 2)]);
        assert_dense(&tasks, "2024-03-11");
    }

    #[test]
    fn dense_after_operation_sequence() {
        let mut tasks = vec![
            task(1, "2024-03-10", 0),
            task(2, "2024-03-10", 1),
            task(3, "2024-03-10", 2),
            task(4, "2024-03-10", 3),
            task(5, "2024-03-11", 0),
        ];
        for (id, from, to) in [(1u64, 0usize, 3usize), (4, 3, 1), (2, 0, 2)] {
            let batch = reorder_within_day(&tasks, id, from, to).unwrap();
            apply(&mut tasks, &batch);
            assert_dense(&tasks, "2024-03-10");
        }
        let batch = move_to_day(&tasks, 3, date("2024-03-11"), 0).unwrap();
        apply(&mut tasks, &batch);
        assert_dense(&tasks, "2024-03-10");
        assert_dense(&tasks, "2024-03-11");
        let batch = drop_on_day(&tasks, 5, date("2024-03-10")).unwrap();
        apply(&mut tasks, &batch);
        assert_dense(&tasks, "2024-03-10");
        assert_dense(&tasks, "2024-03-11");
    }

    #[test]
    fn next_order_counts_existing() {
        let tasks = vec![task(1, "2024-03-10", 0), task(2, "2024-03-10", 1)];
        assert_eq!(next_order(&tasks, date("2024-03-10")), 2);
        assert_eq!(next_order(&tasks, date("2024-03-12")), 0);
    }
}
