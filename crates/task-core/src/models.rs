//! Data models for the task engine.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique task identifier.
pub type TaskId = Uuid;
/// Unique subtask identifier.
pub type SubTaskId = Uuid;
/// Unique project identifier.
pub type ProjectId = Uuid;
/// Unique tag identifier.
pub type TagId = Uuid;

/// Schema version written by this build.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Highest reachable pet level.
pub const MAX_LEVEL: u32 = 999;

/// Colour given to a tag when none is chosen.
pub const DEFAULT_TAG_COLOR: &str = "#9B59B6";

/// Colours handed out to new tags in rotation.
pub const TAG_PALETTE: [&str; 10] = [
    "#E74C3C", // red
    "#E67E22", // orange
    "#F1C40F", // yellow
    "#2ECC71", // green
    "#1ABC9C", // teal
    "#3498DB", // blue
    "#9B59B6", // purple
    "#E91E63", // pink
    "#95A5A6", // grey
    "#34495E", // slate
];

/// How a task repeats once completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Recurrence {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Recurrence {
    pub fn label(&self) -> &'static str {
        match self {
            Recurrence::None => "",
            Recurrence::Daily => "Daily",
            Recurrence::Weekly => "Weekly",
            Recurrence::Monthly => "Monthly",
            Recurrence::Yearly => "Yearly",
        }
    }

    pub fn is_recurring(&self) -> bool {
        !matches!(self, Recurrence::None)
    }
}

fn default_interval() -> u32 {
    1
}

/// A task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    /// Only the calendar day matters.
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub important: bool,
    #[serde(default)]
    pub pinned_today: bool,
    pub created_at: NaiveDateTime,
    #[serde(default)]
    pub completed_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub order: usize,
    #[serde(default)]
    pub subtasks: Vec<SubTask>,
    /// `None` means the task lives in the Inbox.
    #[serde(default)]
    pub project_id: Option<ProjectId>,
    #[serde(default)]
    pub tag_ids: Vec<TagId>,
    #[serde(default)]
    pub recurrence: Recurrence,
    #[serde(default = "default_interval")]
    pub recurrence_interval: u32,
    #[serde(default)]
    pub reminder_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub reminder_notified: bool,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub note_modified_at: Option<NaiveDateTime>,
}

impl Task {
    pub fn new(title: &str, created_at: NaiveDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.to_string(),
            completed: false,
            due_date: None,
            important: false,
            pinned_today: false,
            created_at,
            completed_at: None,
            order: 0,
            subtasks: Vec::new(),
            project_id: None,
            tag_ids: Vec::new(),
            recurrence: Recurrence::None,
            recurrence_interval: 1,
            reminder_at: None,
            reminder_notified: false,
            note: None,
            note_modified_at: None,
        }
    }

    /// Mark complete, stamping the completion time.
    pub fn complete(&mut self, at: NaiveDateTime) {
        self.completed = true;
        self.completed_at = Some(at);
    }

    /// Mark incomplete, clearing the completion time.
    pub fn reopen(&mut self) {
        self.completed = false;
        self.completed_at = None;
    }

    pub fn is_inbox(&self) -> bool {
        self.project_id.is_none()
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        match self.due_date {
            Some(due) => !self.completed && due < today,
            None => false,
        }
    }

    pub fn is_due_on_or_before(&self, day: NaiveDate) -> bool {
        self.due_date.is_some_and(|due| due <= day)
    }

    pub fn has_tag(&self, tag_id: TagId) -> bool {
        self.tag_ids.contains(&tag_id)
    }

    pub fn has_note(&self) -> bool {
        self.note.as_deref().is_some_and(|n| !n.trim().is_empty())
    }

    /// Completed and total subtask counts.
    pub fn subtask_progress(&self) -> (usize, usize) {
        let done = self.subtasks.iter().filter(|s| s.completed).count();
        (done, self.subtasks.len())
    }

    /// Reminder has fired but has not been reported yet.
    pub fn reminder_pending(&self, now: NaiveDateTime) -> bool {
        !self.completed
            && !self.reminder_notified
            && self.reminder_at.is_some_and(|at| at <= now)
    }
}

/// A checklist item owned by a single task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubTask {
    pub id: SubTaskId,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub order: usize,
}

impl SubTask {
    pub fn new(title: &str, order: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.to_string(),
            completed: false,
            order,
        }
    }
}

/// A project groups related tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub order: usize,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub deleted_at: Option<NaiveDateTime>,
}

impl Project {
    pub fn new(name: &str, order: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            order,
            deleted: false,
            deleted_at: None,
        }
    }
}

fn default_tag_color() -> String {
    DEFAULT_TAG_COLOR.to_string()
}

/// A tag attached to tasks with `#name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    #[serde(default = "default_tag_color")]
    pub color: String,
    #[serde(default)]
    pub order: usize,
    /// Hidden tags drop out of the default list but keep working.
    #[serde(default)]
    pub hidden: bool,
}

impl Tag {
    pub fn new(name: &str, color: &str, order: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            color: color.to_string(),
            order,
            hidden: false,
        }
    }

    /// Palette colour for the n-th tag created.
    pub fn palette_color(index: usize) -> &'static str {
        TAG_PALETTE[index % TAG_PALETTE.len()]
    }
}

/// Engagement state read by the pet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PetStatus {
    pub level: u32,
    pub total_completed: u32,
    pub today_completed: u32,
    pub last_active_date: Option<NaiveDate>,
    pub last_app_open_date: Option<NaiveDate>,
    pub yesterday_was_all_done: bool,
    pub has_shown_greeting_today: bool,
}

impl Default for PetStatus {
    fn default() -> Self {
        Self {
            level: 1,
            total_completed: 0,
            today_completed: 0,
            last_active_date: None,
            last_app_open_date: None,
            yesterday_was_all_done: false,
            has_shown_greeting_today: false,
        }
    }
}

impl PetStatus {
    /// Level reached after `total_completed` completions.
    pub fn level_for(total_completed: u32) -> u32 {
        (1 + total_completed / 10).min(MAX_LEVEL)
    }

    /// Reset the per-day completion counter when `today` is a new day.
    /// Returns true if it was reset.
    pub fn roll_day(&mut self, today: NaiveDate) -> bool {
        if self.last_active_date == Some(today) {
            return false;
        }
        self.last_active_date = Some(today);
        self.today_completed = 0;
        true
    }

    /// Count one completion. Returns true when the level went up.
    pub fn record_completion(&mut self, today: NaiveDate) -> bool {
        self.total_completed += 1;
        if self.last_active_date != Some(today) {
            self.last_active_date = Some(today);
            self.today_completed = 0;
        }
        self.today_completed += 1;

        let previous = self.level;
        self.level = Self::level_for(self.total_completed);
        self.level > previous
    }
}

/// Counters for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    pub date: NaiveDate,
    #[serde(default)]
    pub completed: u32,
    #[serde(default)]
    pub created: u32,
}

/// Rolling completion history and streaks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Statistics {
    pub daily_history: Vec<DailyStats>,
    pub current_streak: u32,
    pub best_streak: u32,
    pub last_completion_date: Option<NaiveDate>,
}

/// Everything that gets persisted, saved and loaded as one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppData {
    pub schema_version: u32,
    pub tasks: Vec<Task>,
    pub projects: Vec<Project>,
    pub tags: Vec<Tag>,
    pub pet_status: PetStatus,
    pub dark_mode: bool,
    pub statistics: Statistics,
}

impl Default for AppData {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            tasks: Vec::new(),
            projects: Vec::new(),
            tags: Vec::new(),
            pet_status: PetStatus::default(),
            dark_mode: false,
            statistics: Statistics::default(),
        }
    }
}

/// Sidebar expand/collapse preferences, stored apart from [`AppData`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UiSettings {
    pub projects_expanded: bool,
    pub tags_expanded: bool,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            projects_expanded: true,
            tags_expanded: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noon(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_complete_and_reopen_keep_timestamp_in_sync() {
        let mut task = Task::new("Write report", noon(2024, 1, 10));
        task.complete(noon(2024, 1, 11));
        assert!(task.completed);
        assert_eq!(task.completed_at, Some(noon(2024, 1, 11)));

        task.reopen();
        assert!(!task.completed);
        assert_eq!(task.completed_at, None);
    }

    #[test]
    fn test_overdue() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let mut task = Task::new("Pay rent", noon(2024, 1, 1));
        assert!(!task.is_overdue(today));

        task.due_date = NaiveDate::from_ymd_opt(2024, 1, 9);
        assert!(task.is_overdue(today));

        task.complete(noon(2024, 1, 10));
        assert!(!task.is_overdue(today));
    }

    #[test]
    fn test_reminder_pending() {
        let mut task = Task::new("Call", noon(2024, 1, 1));
        task.reminder_at = Some(noon(2024, 1, 2));
        assert!(!task.reminder_pending(noon(2024, 1, 1)));
        assert!(task.reminder_pending(noon(2024, 1, 2)));

        task.reminder_notified = true;
        assert!(!task.reminder_pending(noon(2024, 1, 3)));
    }

    #[test]
    fn test_level_is_capped() {
        assert_eq!(PetStatus::level_for(0), 1);
        assert_eq!(PetStatus::level_for(9), 1);
        assert_eq!(PetStatus::level_for(10), 2);
        assert_eq!(PetStatus::level_for(1_000_000), MAX_LEVEL);
    }

    #[test]
    fn test_record_completion_resets_on_new_day() {
        let mut pet = PetStatus::default();
        let day1 = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let day2 = day1.succ_opt().unwrap();

        for _ in 0..9 {
            assert!(!pet.record_completion(day1));
        }
        assert_eq!(pet.today_completed, 9);

        assert!(pet.record_completion(day2));
        assert_eq!(pet.today_completed, 1);
        assert_eq!(pet.total_completed, 10);
        assert_eq!(pet.level, 2);
    }

    #[test]
    fn test_palette_rotates() {
        assert_eq!(Tag::palette_color(0), "#E74C3C");
        assert_eq!(Tag::palette_color(10), "#E74C3C");
        assert_eq!(Tag::palette_color(6), DEFAULT_TAG_COLOR);
    }

    #[test]
    fn test_app_data_fills_missing_fields() {
        let data: AppData = serde_json::from_str(r#"{"tasks": []}"#).unwrap();
        assert_eq!(data.schema_version, CURRENT_SCHEMA_VERSION);
        assert_eq!(data.pet_status.level, 1);
        assert!(data.projects.is_empty());
    }
}
