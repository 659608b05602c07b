//! # task-core
//!
//! Single-user task engine for the task manager.
//!
//! ## Features
//!
//! - Tasks, subtasks, projects (soft delete) and colour-coded tags
//! - Quick-add parsing of due dates and `#tags` in English and Korean
//! - Crash-safe JSON storage with daily rolling backups
//! - Bounded undo/redo history
//! - Recurring tasks, reminders, streaks and a small levelling pet

mod clock;
mod engagement;
mod engine;
mod error;
mod models;
mod parser;
mod recurrence;
mod stats;
mod storage;
mod undo;

pub use clock::{Clock, FixedClock, SystemClock};
pub use engagement::{completion_reaction, current_mood, greet, select_greeting, Greeting, Mood, Reaction};
pub use engine::{DataChanged, TaskEngine, ToggleOutcome};
pub use error::{StorageError, StorageResult};
pub use models::{
    AppData, DailyStats, PetStatus, Project, ProjectId, Recurrence, Statistics, SubTask, SubTaskId,
    Tag, TagId, Task, TaskId, UiSettings, CURRENT_SCHEMA_VERSION, DEFAULT_TAG_COLOR, MAX_LEVEL,
    TAG_PALETTE,
};
pub use parser::{parse, ParseResult};
pub use recurrence::{next_due_date, next_occurrence};
pub use stats::{HeatmapCell, HISTORY_DAYS};
pub use storage::{
    BackupInfo, Storage, BACKUP_RETENTION_DAYS, MAX_IMPORT_BYTES, MAX_IMPORT_TASKS,
};
pub use undo::{
    date_change_description, CompletionState, UndoAction, UndoEntry, UndoKind, UndoLog,
    MAX_UNDO_DEPTH,
};
