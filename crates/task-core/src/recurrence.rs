//! Successor tasks for recurring tasks.

use crate::models::{Recurrence, SubTask, Task};
use chrono::{Days, Months, NaiveDate, NaiveDateTime};
use uuid::Uuid;

/// Due date `interval` steps of `kind` after `base`.
///
/// Month and year steps clamp to the last day of a shorter month.
pub fn next_due_date(base: NaiveDate, kind: Recurrence, interval: u32) -> Option<NaiveDate> {
    let interval = interval.max(1);
    match kind {
        Recurrence::None => None,
        Recurrence::Daily => base.checked_add_days(Days::new(u64::from(interval))),
        Recurrence::Weekly => base.checked_add_days(Days::new(u64::from(interval) * 7)),
        Recurrence::Monthly => base.checked_add_months(Months::new(interval)),
        Recurrence::Yearly => base.checked_add_months(Months::new(interval.saturating_mul(12))),
    }
}

/// Build the next instance of a recurring task.
///
/// The successor is a fresh, incomplete task due one interval after the
/// completed task's due date (or after `today` if it had none). Subtasks are
/// copied unchecked. Returns `None` for non-recurring tasks. `order` is left
/// at zero for the caller to assign.
pub fn next_occurrence(task: &Task, today: NaiveDate, created_at: NaiveDateTime) -> Option<Task> {
    if !task.recurrence.is_recurring() {
        return None;
    }

    let base = task.due_date.unwrap_or(today);
    let due = next_due_date(base, task.recurrence, task.recurrence_interval)?;

    let mut next = Task::new(&task.title, created_at);
    next.due_date = Some(due);
    next.important = task.important;
    next.recurrence = task.recurrence;
    next.recurrence_interval = task.recurrence_interval.max(1);
    next.project_id = task.project_id;
    next.tag_ids = task.tag_ids.clone();
    next.subtasks = task
        .subtasks
        .iter()
        .map(|s| SubTask {
            id: Uuid::new_v4(),
            title: s.title.clone(),
            completed: false,
            order: s.order,
        })
        .collect();

    Some(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(d: NaiveDate) -> NaiveDateTime {
        d.and_hms_opt(9, 0, 0).unwrap()
    }

    #[test]
    fn test_next_due_date_per_kind() {
        let base = date(2024, 1, 31);
        assert_eq!(next_due_date(base, Recurrence::Daily, 2), Some(date(2024, 2, 2)));
        assert_eq!(next_due_date(base, Recurrence::Weekly, 1), Some(date(2024, 2, 7)));
        assert_eq!(next_due_date(base, Recurrence::Monthly, 1), Some(date(2024, 2, 29)));
        assert_eq!(next_due_date(date(2024, 2, 29), Recurrence::Yearly, 1), Some(date(2025, 2, 28)));
        assert_eq!(next_due_date(base, Recurrence::None, 1), None);
    }

    #[test]
    fn test_zero_interval_counts_as_one() {
        assert_eq!(
            next_due_date(date(2024, 1, 1), Recurrence::Daily, 0),
            Some(date(2024, 1, 2))
        );
    }

    #[test]
    fn test_next_occurrence_copies_subtasks_unchecked() {
        let today = date(2024, 1, 10);
        let mut task = Task::new("Water plants", at(today));
        task.recurrence = Recurrence::Weekly;
        task.recurrence_interval = 2;
        task.due_date = Some(date(2024, 1, 8));
        task.important = true;
        let mut sub = SubTask::new("Balcony", 0);
        sub.completed = true;
        task.subtasks.push(sub);
        task.complete(at(today));

        let next = next_occurrence(&task, today, at(today)).unwrap();
        assert_ne!(next.id, task.id);
        assert_eq!(next.title, "Water plants");
        assert_eq!(next.due_date, Some(date(2024, 1, 22)));
        assert!(next.important);
        assert!(!next.completed);
        assert_eq!(next.completed_at, None);
        assert_eq!(next.subtasks.len(), 1);
        assert!(!next.subtasks[0].completed);
        assert_ne!(next.subtasks[0].id, task.subtasks[0].id);
    }

    #[test]
    fn test_next_occurrence_without_due_date_uses_today() {
        let today = date(2024, 1, 10);
        let mut task = Task::new("Stretch", at(today));
        task.recurrence = Recurrence::Daily;

        let next = next_occurrence(&task, today, at(today)).unwrap();
        assert_eq!(next.due_date, Some(date(2024, 1, 11)));
    }

    #[test]
    fn test_non_recurring_has_no_successor() {
        let today = date(2024, 1, 10);
        let task = Task::new("Once", at(today));
        assert!(next_occurrence(&task, today, at(today)).is_none());
    }
}
