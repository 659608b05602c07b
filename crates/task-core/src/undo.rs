//! Bounded undo/redo history over [`TaskEngine`] mutations.

use crate::engine::{TaskEngine, ToggleOutcome};
use crate::models::{Task, TaskId};
use chrono::{Days, NaiveDate, NaiveDateTime};
use std::collections::VecDeque;
use tracing::debug;

/// Most actions kept on the undo stack.
pub const MAX_UNDO_DEPTH: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoKind {
    Completed,
    Uncompleted,
    Deleted,
    DateChanged,
    ImportantToggled,
    PinnedToggled,
    Created,
}

/// Completion flag and timestamp as a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionState {
    pub completed: bool,
    pub completed_at: Option<NaiveDateTime>,
}

impl CompletionState {
    pub fn of(task: &Task) -> Self {
        Self {
            completed: task.completed,
            completed_at: task.completed_at,
        }
    }
}

/// A reversible change to one task.
#[derive(Debug, Clone, PartialEq)]
pub enum UndoAction {
    Completion {
        task: TaskId,
        before: CompletionState,
        after: CompletionState,
    },
    /// Holds the removed task so it can be put back.
    Deleted { task: Task },
    DateChanged {
        task: TaskId,
        previous: Option<NaiveDate>,
        new: Option<NaiveDate>,
    },
    ImportantToggled { task: TaskId, previous: bool },
    PinnedToggled { task: TaskId, previous: bool },
    /// Holds the task as of its last removal so redo can restore it.
    Created { task: Task },
}

impl UndoAction {
    pub fn kind(&self) -> UndoKind {
        match self {
            UndoAction::Completion { after, .. } if after.completed => UndoKind::Completed,
            UndoAction::Completion { .. } => UndoKind::Uncompleted,
            UndoAction::Deleted { .. } => UndoKind::Deleted,
            UndoAction::DateChanged { .. } => UndoKind::DateChanged,
            UndoAction::ImportantToggled { .. } => UndoKind::ImportantToggled,
            UndoAction::PinnedToggled { .. } => UndoKind::PinnedToggled,
            UndoAction::Created { .. } => UndoKind::Created,
        }
    }

    pub fn task_id(&self) -> TaskId {
        match self {
            UndoAction::Completion { task, .. }
            | UndoAction::DateChanged { task, .. }
            | UndoAction::ImportantToggled { task, .. }
            | UndoAction::PinnedToggled { task, .. } => *task,
            UndoAction::Deleted { task } | UndoAction::Created { task } => task.id,
        }
    }

    fn describe(&self, today: NaiveDate) -> String {
        match self {
            UndoAction::Completion { after, .. } => {
                if after.completed {
                    "Marked complete".to_string()
                } else {
                    "Marked incomplete".to_string()
                }
            }
            UndoAction::Deleted { .. } => "Deleted task".to_string(),
            UndoAction::DateChanged { new, .. } => date_change_description(*new, today),
            UndoAction::ImportantToggled { previous, .. } => important_message(!previous),
            UndoAction::PinnedToggled { previous, .. } => pinned_message(!previous),
            UndoAction::Created { .. } => "Created task".to_string(),
        }
    }

    /// Reverse the change. Returns the message to show, or `None` if the
    /// task it refers to is gone.
    fn revert(&mut self, engine: &mut TaskEngine) -> Option<String> {
        let today = engine.today();
        match self {
            UndoAction::Completion { task, before, .. } => {
                engine
                    .set_completion_state(*task, before.completed, before.completed_at)
                    .then(|| {
                        if before.completed {
                            "Restored completion".to_string()
                        } else {
                            "Restored as incomplete".to_string()
                        }
                    })
            }
            UndoAction::Deleted { task } => engine
                .restore_task(task.clone())
                .then(|| "Restored deleted task".to_string()),
            UndoAction::DateChanged { task, previous, .. } => engine
                .set_due_date(*task, *previous)
                .then(|| date_change_description(*previous, today)),
            UndoAction::ImportantToggled { task, previous } => engine
                .set_important(*task, *previous)
                .then(|| important_message(*previous)),
            UndoAction::PinnedToggled { task, previous } => engine
                .set_pinned_today(*task, *previous)
                .then(|| pinned_message(*previous)),
            UndoAction::Created { task } => {
                *task = engine.delete_task(task.id)?;
                Some("Removed created task".to_string())
            }
        }
    }

    /// Apply the change again after a revert.
    fn reapply(&mut self, engine: &mut TaskEngine) -> Option<String> {
        let today = engine.today();
        match self {
            UndoAction::Completion { task, after, .. } => engine
                .set_completion_state(*task, after.completed, after.completed_at)
                .then(|| {
                    if after.completed {
                        "Marked complete".to_string()
                    } else {
                        "Marked incomplete".to_string()
                    }
                }),
            UndoAction::Deleted { task } => {
                *task = engine.delete_task(task.id)?;
                Some("Deleted again".to_string())
            }
            UndoAction::DateChanged { task, new, .. } => engine
                .set_due_date(*task, *new)
                .then(|| date_change_description(*new, today)),
            UndoAction::ImportantToggled { task, previous } => engine
                .set_important(*task, !*previous)
                .then(|| important_message(!*previous)),
            UndoAction::PinnedToggled { task, previous } => engine
                .set_pinned_today(*task, !*previous)
                .then(|| pinned_message(!*previous)),
            UndoAction::Created { task } => engine
                .restore_task(task.clone())
                .then(|| "Created again".to_string()),
        }
    }
}

fn important_message(important: bool) -> String {
    if important {
        "Marked important".to_string()
    } else {
        "Removed important".to_string()
    }
}

fn pinned_message(pinned: bool) -> String {
    if pinned {
        "Pinned to today".to_string()
    } else {
        "Unpinned from today".to_string()
    }
}

/// Short description of a due-date move, relative to `today`.
pub fn date_change_description(date: Option<NaiveDate>, today: NaiveDate) -> String {
    let Some(date) = date else {
        return "Cleared due date".to_string();
    };

    if date == today {
        "Moved to today".to_string()
    } else if Some(date) == today.checked_add_days(Days::new(1)) {
        "Moved to tomorrow".to_string()
    } else if Some(date) == today.checked_sub_days(Days::new(1)) {
        "Moved to yesterday".to_string()
    } else {
        format!("Moved to {}", date.format("%A"))
    }
}

/// A recorded action with the text shown when it was made.
#[derive(Debug, Clone, PartialEq)]
pub struct UndoEntry {
    pub action: UndoAction,
    pub description: String,
}

/// Two-stack linear history.
#[derive(Debug, Default)]
pub struct UndoLog {
    undo: VecDeque<UndoEntry>,
    redo: Vec<UndoEntry>,
}

impl UndoLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push an action. Clears redo history and drops the oldest entry past
    /// [`MAX_UNDO_DEPTH`].
    pub fn record(&mut self, action: UndoAction, today: NaiveDate) {
        let description = action.describe(today);
        self.undo.push_back(UndoEntry {
            action,
            description,
        });
        self.redo.clear();
        while self.undo.len() > MAX_UNDO_DEPTH {
            self.undo.pop_front();
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// Undo history, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &UndoEntry> {
        self.undo.iter()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    /// Revert the newest action. An action whose task no longer exists is
    /// discarded and `None` is returned.
    pub fn undo(&mut self, engine: &mut TaskEngine) -> Option<String> {
        let mut entry = self.undo.pop_back()?;
        match entry.action.revert(engine) {
            Some(message) => {
                self.redo.push(entry);
                Some(message)
            }
            None => {
                debug!(task = %entry.action.task_id(), "Discarded undo for missing task");
                None
            }
        }
    }

    /// Re-apply the most recently undone action.
    pub fn redo(&mut self, engine: &mut TaskEngine) -> Option<String> {
        let mut entry = self.redo.pop()?;
        match entry.action.reapply(engine) {
            Some(message) => {
                self.undo.push_back(entry);
                Some(message)
            }
            None => {
                debug!(task = %entry.action.task_id(), "Discarded redo for missing task");
                None
            }
        }
    }

    // Recording wrappers around engine calls

    pub fn toggle_complete(&mut self, engine: &mut TaskEngine, id: TaskId) -> Option<ToggleOutcome> {
        let before = CompletionState::of(engine.task(id)?);
        let outcome = engine.toggle_complete(id)?;
        let after = CompletionState::of(engine.task(id)?);
        self.record(
            UndoAction::Completion {
                task: id,
                before,
                after,
            },
            engine.today(),
        );
        Some(outcome)
    }

    pub fn toggle_important(&mut self, engine: &mut TaskEngine, id: TaskId) -> Option<bool> {
        let previous = engine.task(id)?.important;
        let important = engine.toggle_important(id)?;
        self.record(UndoAction::ImportantToggled { task: id, previous }, engine.today());
        Some(important)
    }

    pub fn toggle_pinned_today(&mut self, engine: &mut TaskEngine, id: TaskId) -> Option<bool> {
        let previous = engine.task(id)?.pinned_today;
        let pinned = engine.toggle_pinned_today(id)?;
        self.record(UndoAction::PinnedToggled { task: id, previous }, engine.today());
        Some(pinned)
    }

    pub fn set_due_date(
        &mut self,
        engine: &mut TaskEngine,
        id: TaskId,
        due_date: Option<NaiveDate>,
    ) -> bool {
        let Some(previous) = engine.task(id).map(|t| t.due_date) else {
            return false;
        };
        if !engine.set_due_date(id, due_date) {
            return false;
        }
        self.record(
            UndoAction::DateChanged {
                task: id,
                previous,
                new: due_date,
            },
            engine.today(),
        );
        true
    }

    pub fn delete_task(&mut self, engine: &mut TaskEngine, id: TaskId) -> bool {
        let Some(task) = engine.delete_task(id) else {
            return false;
        };
        self.record(UndoAction::Deleted { task }, engine.today());
        true
    }

    pub fn add_task(&mut self, engine: &mut TaskEngine, text: &str) -> TaskId {
        let id = engine.add_task(text, None);
        if let Some(task) = engine.task(id).cloned() {
            self.record(UndoAction::Created { task }, engine.today());
        }
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, FixedClock};
    use crate::models::Recurrence;
    use crate::storage::Storage;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn setup() -> (TempDir, Arc<FixedClock>, TaskEngine, UndoLog) {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(FixedClock::at_date(date(2024, 1, 10)));
        let engine = TaskEngine::new(Storage::open(dir.path(), clock.clone()), clock.clone());
        (dir, clock, engine, UndoLog::new())
    }

    #[test]
    fn test_undo_completion_does_not_spawn_again() {
        let (_dir, clock, mut engine, mut log) = setup();
        let id = engine.add_task("Stretch 오늘", None);
        engine.set_recurrence(id, Recurrence::Daily, 1);

        let outcome = log.toggle_complete(&mut engine, id).unwrap();
        assert!(outcome.spawned.is_some());
        assert_eq!(engine.tasks().len(), 2);

        assert_eq!(log.undo(&mut engine).as_deref(), Some("Restored as incomplete"));
        let task = engine.task(id).unwrap();
        assert!(!task.completed);
        assert_eq!(task.completed_at, None);
        assert_eq!(engine.tasks().len(), 2);

        assert_eq!(log.redo(&mut engine).as_deref(), Some("Marked complete"));
        assert_eq!(engine.task(id).unwrap().completed_at, Some(clock.now()));
        assert_eq!(engine.tasks().len(), 2);
        assert_eq!(engine.pet_status().total_completed, 1);
    }

    #[test]
    fn test_undo_reopen_restores_original_timestamp() {
        let (_dir, clock, mut engine, mut log) = setup();
        let id = engine.add_task("Report", None);
        engine.toggle_complete(id);
        let completed_at = clock.now();

        clock.advance_days(1);
        log.toggle_complete(&mut engine, id);
        assert!(!engine.task(id).unwrap().completed);

        log.undo(&mut engine);
        assert_eq!(engine.task(id).unwrap().completed_at, Some(completed_at));
    }

    #[test]
    fn test_depth_is_capped_dropping_oldest() {
        let (_dir, _clock, mut engine, mut log) = setup();
        let ids: Vec<_> = (0..=MAX_UNDO_DEPTH)
            .map(|i| log.add_task(&mut engine, &format!("t{i}")))
            .collect();

        assert_eq!(log.undo_len(), MAX_UNDO_DEPTH);
        let oldest = log.entries().next().unwrap().action.task_id();
        assert_eq!(oldest, ids[1]);
        let newest = log.entries().last().unwrap().action.task_id();
        assert_eq!(newest, ids[MAX_UNDO_DEPTH]);
    }

    #[test]
    fn test_recording_clears_redo() {
        let (_dir, _clock, mut engine, mut log) = setup();
        let id = engine.add_task("t", None);
        log.toggle_important(&mut engine, id);
        log.undo(&mut engine);
        assert!(log.can_redo());

        log.toggle_pinned_today(&mut engine, id);
        assert!(!log.can_redo());
        assert_eq!(log.undo_len(), 1);
    }

    #[test]
    fn test_delete_and_create_round_trip() {
        let (_dir, _clock, mut engine, mut log) = setup();
        let id = log.add_task(&mut engine, "temp");
        assert!(log.delete_task(&mut engine, id));
        assert!(engine.task(id).is_none());

        assert_eq!(log.undo(&mut engine).as_deref(), Some("Restored deleted task"));
        assert!(engine.task(id).is_some());
        assert_eq!(log.undo(&mut engine).as_deref(), Some("Removed created task"));
        assert!(engine.task(id).is_none());

        assert_eq!(log.redo(&mut engine).as_deref(), Some("Created again"));
        assert!(engine.task(id).is_some());
        assert_eq!(log.redo(&mut engine).as_deref(), Some("Deleted again"));
        assert!(engine.task(id).is_none());
    }

    #[test]
    fn test_date_change_descriptions() {
        let (_dir, _clock, mut engine, mut log) = setup();
        let id = engine.add_task("t", None);

        assert!(log.set_due_date(&mut engine, id, Some(date(2024, 1, 11))));
        assert_eq!(log.entries().last().unwrap().description, "Moved to tomorrow");
        assert!(log.set_due_date(&mut engine, id, Some(date(2024, 1, 13))));
        assert_eq!(log.entries().last().unwrap().description, "Moved to Saturday");

        assert_eq!(log.undo(&mut engine).as_deref(), Some("Moved to tomorrow"));
        assert_eq!(engine.task(id).unwrap().due_date, Some(date(2024, 1, 11)));
        assert_eq!(log.undo(&mut engine).as_deref(), Some("Cleared due date"));
        assert_eq!(engine.task(id).unwrap().due_date, None);
    }

    #[test]
    fn test_date_change_description_cases() {
        let today = date(2024, 1, 10);
        assert_eq!(date_change_description(Some(today), today), "Moved to today");
        assert_eq!(date_change_description(Some(date(2024, 1, 9)), today), "Moved to yesterday");
        assert_eq!(date_change_description(Some(date(2024, 1, 15)), today), "Moved to Monday");
        assert_eq!(date_change_description(None, today), "Cleared due date");
    }

    #[test]
    fn test_missing_task_is_discarded() {
        let (_dir, _clock, mut engine, mut log) = setup();
        let id = engine.add_task("t", None);
        log.toggle_important(&mut engine, id);
        engine.delete_task(id);

        assert_eq!(log.undo(&mut engine), None);
        assert!(!log.can_undo());
        assert!(!log.can_redo());
    }

    #[test]
    fn test_empty_stacks_are_noops() {
        let (_dir, clock, mut engine, mut log) = setup();
        assert_eq!(log.undo(&mut engine), None);
        assert_eq!(log.redo(&mut engine), None);
        assert_eq!(clock.today(), date(2024, 1, 10));
    }

    #[test]
    fn test_kinds() {
        let (_dir, _clock, mut engine, mut log) = setup();
        let id = engine.add_task("t", None);
        log.toggle_complete(&mut engine, id);
        log.toggle_complete(&mut engine, id);
        let kinds: Vec<_> = log.entries().map(|e| e.action.kind()).collect();
        assert_eq!(kinds, vec![UndoKind::Completed, UndoKind::Uncompleted]);

        log.clear();
        assert_eq!(log.undo_len(), 0);
        assert_eq!(log.redo_len(), 0);
    }
}
