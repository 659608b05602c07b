//! The task engine: sole owner and mutator of the in-memory [`AppData`].
//!
//! Every mutation ends in [`TaskEngine::commit`], which saves through
//! [`Storage`] and then notifies subscribers. Queries borrow from the live
//! aggregate and never persist anything.

use crate::clock::Clock;
use crate::models::{
    AppData, PetStatus, Project, ProjectId, Recurrence, SubTask, SubTaskId, Tag, TagId, Task,
    TaskId,
};
use crate::parser;
use crate::recurrence::next_occurrence;
use crate::storage::Storage;
use chrono::{NaiveDate, NaiveDateTime};
use std::cmp::Ordering;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use tracing::{debug, info};

/// Sent to subscribers after a mutation and its save attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataChanged {
    /// Whether the save reached disk.
    pub persisted: bool,
}

/// What happened when a task's completion was toggled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToggleOutcome {
    /// New completion state.
    pub completed: bool,
    pub leveled_up: bool,
    /// First completion of the day.
    pub first_today: bool,
    /// Today view has no incomplete tasks left.
    pub all_done: bool,
    /// Successor created for a recurring task.
    pub spawned: Option<TaskId>,
}

/// Incomplete first, important first, earliest due date, manual order.
fn by_importance(a: &Task, b: &Task) -> Ordering {
    a.completed
        .cmp(&b.completed)
        .then(b.important.cmp(&a.important))
        .then(cmp_due(a.due_date, b.due_date))
        .then(a.order.cmp(&b.order))
}

/// Incomplete first, earliest due date, important first, manual order.
fn by_due_date(a: &Task, b: &Task) -> Ordering {
    a.completed
        .cmp(&b.completed)
        .then(cmp_due(a.due_date, b.due_date))
        .then(b.important.cmp(&a.important))
        .then(a.order.cmp(&b.order))
}

/// Undated tasks sort last.
fn cmp_due(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub struct TaskEngine {
    data: AppData,
    storage: Storage,
    clock: Arc<dyn Clock>,
    subscribers: Vec<Sender<DataChanged>>,
}

impl TaskEngine {
    /// Load the aggregate from `storage` and take ownership of both.
    pub fn new(storage: Storage, clock: Arc<dyn Clock>) -> Self {
        let data = storage.load();
        info!(
            tasks = data.tasks.len(),
            projects = data.projects.len(),
            tags = data.tags.len(),
            "Loaded task data"
        );
        Self {
            data,
            storage,
            clock,
            subscribers: Vec::new(),
        }
    }

    pub fn data(&self) -> &AppData {
        &self.data
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Receive a [`DataChanged`] after every committed mutation.
    pub fn subscribe(&mut self) -> Receiver<DataChanged> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    /// Save, then notify. Dropped receivers are pruned.
    fn commit(&mut self) -> bool {
        let persisted = self.storage.save(&mut self.data);
        let event = DataChanged { persisted };
        self.subscribers.retain(|tx| tx.send(event).is_ok());
        persisted
    }

    /// Persist the current state without changing it.
    pub fn save(&mut self) -> bool {
        self.commit()
    }

    fn task_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.data.tasks.iter_mut().find(|t| t.id == id)
    }

    fn project_mut(&mut self, id: ProjectId) -> Option<&mut Project> {
        self.data.projects.iter_mut().find(|p| p.id == id)
    }

    fn tag_mut(&mut self, id: TagId) -> Option<&mut Tag> {
        self.data.tags.iter_mut().find(|t| t.id == id)
    }

    // Task queries

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.data.tasks.iter().find(|t| t.id == id)
    }

    /// Every task in backing-list order.
    pub fn tasks(&self) -> &[Task] {
        &self.data.tasks
    }

    fn view<P>(&self, show_completed: bool, pred: P, order: fn(&Task, &Task) -> Ordering) -> Vec<&Task>
    where
        P: Fn(&Task) -> bool,
    {
        let mut tasks: Vec<&Task> = self
            .data
            .tasks
            .iter()
            .filter(|t| show_completed || !t.completed)
            .filter(|t| pred(t))
            .collect();
        tasks.sort_by(|a, b| order(a, b));
        tasks
    }

    pub fn all_tasks(&self, show_completed: bool) -> Vec<&Task> {
        self.view(show_completed, |_| true, by_importance)
    }

    pub fn inbox_tasks(&self, show_completed: bool) -> Vec<&Task> {
        self.view(show_completed, Task::is_inbox, by_importance)
    }

    /// Inbox tasks pinned to today or due on or before today.
    pub fn today_tasks(&self, show_completed: bool) -> Vec<&Task> {
        let today = self.today();
        self.view(
            show_completed,
            |t| t.is_inbox() && (t.pinned_today || t.is_due_on_or_before(today)),
            by_importance,
        )
    }

    pub fn upcoming_tasks(&self, show_completed: bool) -> Vec<&Task> {
        let today = self.today();
        self.view(
            show_completed,
            |t| t.is_inbox() && t.due_date.is_some_and(|d| d > today),
            by_due_date,
        )
    }

    /// Inbox tasks due within `start..=end`.
    pub fn week_tasks(&self, start: NaiveDate, end: NaiveDate, show_completed: bool) -> Vec<&Task> {
        self.view(
            show_completed,
            |t| t.is_inbox() && t.due_date.is_some_and(|d| d >= start && d <= end),
            by_due_date,
        )
    }

    pub fn unscheduled_tasks(&self, show_completed: bool) -> Vec<&Task> {
        self.view(
            show_completed,
            |t| t.is_inbox() && t.due_date.is_none(),
            by_importance,
        )
    }

    pub fn project_tasks(&self, project_id: ProjectId, show_completed: bool) -> Vec<&Task> {
        self.view(
            show_completed,
            |t| t.project_id == Some(project_id),
            by_importance,
        )
    }

    pub fn tag_tasks(&self, tag_id: TagId, show_completed: bool) -> Vec<&Task> {
        self.view(show_completed, |t| t.has_tag(tag_id), by_importance)
    }

    /// Tasks whose title contains every whitespace-separated term,
    /// ignoring case. A blank query matches nothing.
    pub fn search(&self, query: &str, show_completed: bool) -> Vec<&Task> {
        let terms: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
        if terms.is_empty() {
            return Vec::new();
        }

        self.view(
            show_completed,
            |t| {
                let title = t.title.to_lowercase();
                terms.iter().all(|term| title.contains(term.as_str()))
            },
            by_importance,
        )
    }

    /// Incomplete tasks in the Today view.
    pub fn today_task_count(&self) -> usize {
        self.today_tasks(false).len()
    }

    pub fn has_overdue_tasks(&self) -> bool {
        let today = self.today();
        self.data.tasks.iter().any(|t| t.is_overdue(today))
    }

    /// Tasks whose reminder has fired and has not been reported.
    pub fn pending_reminders(&self) -> Vec<&Task> {
        let now = self.clock.now();
        self.data
            .tasks
            .iter()
            .filter(|t| t.reminder_pending(now))
            .collect()
    }

    // Task mutations

    /// Create a task from free text, extracting a due date and `#tags`.
    /// A missing or deleted project puts the task in the Inbox.
    pub fn add_task(&mut self, text: &str, project_id: Option<ProjectId>) -> TaskId {
        let today = self.today();
        let parsed = parser::parse(text, today);

        let project_id = project_id.filter(|id| self.project(*id).is_some_and(|p| !p.deleted));
        let mut task = Task::new(&parsed.title, self.clock.now());
        task.due_date = parsed.due_date;
        task.project_id = project_id;
        task.order = self.data.tasks.len();

        for name in &parsed.tags {
            if let Some(tag_id) = self.find_or_create_tag(name, None) {
                if !task.tag_ids.contains(&tag_id) {
                    task.tag_ids.push(tag_id);
                }
            }
        }

        let id = task.id;
        debug!(%id, title = %task.title, due = ?task.due_date, "Added task");
        self.data.tasks.push(task);
        self.data.statistics.record(today, 0, 1);
        self.commit();
        id
    }

    /// Flip completion. Completing counts toward the pet, the statistics,
    /// and the streak, and spawns the next instance of a recurring task.
    /// Reopening only clears the completion time.
    pub fn toggle_complete(&mut self, id: TaskId) -> Option<ToggleOutcome> {
        let now = self.clock.now();
        let today = self.today();
        let task = self.task_mut(id)?;

        if task.completed {
            task.reopen();
            self.commit();
            return Some(ToggleOutcome::default());
        }

        task.complete(now);
        let successor = next_occurrence(task, today, now);

        let pet = &mut self.data.pet_status;
        let first_today = pet.last_active_date != Some(today) || pet.today_completed == 0;
        let leveled_up = pet.record_completion(today);
        self.data.statistics.record(today, 1, 0);

        let spawned = successor.map(|mut next| {
            next.order = self.data.tasks.len();
            let next_id = next.id;
            debug!(%id, next = %next_id, due = ?next.due_date, "Spawned recurring task");
            self.data.tasks.push(next);
            next_id
        });

        if leveled_up {
            info!(level = self.data.pet_status.level, "Level up");
        }

        let all_done = self.today_task_count() == 0;
        self.commit();
        Some(ToggleOutcome {
            completed: true,
            leveled_up,
            first_today,
            all_done,
            spawned,
        })
    }

    /// Returns the new flag.
    pub fn toggle_important(&mut self, id: TaskId) -> Option<bool> {
        let task = self.task_mut(id)?;
        task.important = !task.important;
        let important = task.important;
        self.commit();
        Some(important)
    }

    /// Returns the new flag.
    pub fn toggle_pinned_today(&mut self, id: TaskId) -> Option<bool> {
        let task = self.task_mut(id)?;
        task.pinned_today = !task.pinned_today;
        let pinned = task.pinned_today;
        self.commit();
        Some(pinned)
    }

    /// Write completion state directly, without counters or recurrence.
    pub fn set_completion_state(
        &mut self,
        id: TaskId,
        completed: bool,
        completed_at: Option<NaiveDateTime>,
    ) -> bool {
        self.update_task(id, |task| {
            task.completed = completed;
            task.completed_at = if completed { completed_at } else { None };
        })
    }

    pub fn set_important(&mut self, id: TaskId, important: bool) -> bool {
        self.update_task(id, |task| task.important = important)
    }

    pub fn set_pinned_today(&mut self, id: TaskId, pinned: bool) -> bool {
        self.update_task(id, |task| task.pinned_today = pinned)
    }

    pub fn set_due_date(&mut self, id: TaskId, due_date: Option<NaiveDate>) -> bool {
        self.update_task(id, |task| task.due_date = due_date)
    }

    pub fn set_recurrence(&mut self, id: TaskId, kind: Recurrence, interval: u32) -> bool {
        self.update_task(id, |task| {
            task.recurrence = kind;
            task.recurrence_interval = interval.max(1);
        })
    }

    /// Set or clear the reminder. Re-arms a reminder that already fired.
    pub fn set_reminder(&mut self, id: TaskId, at: Option<NaiveDateTime>) -> bool {
        self.update_task(id, |task| {
            task.reminder_at = at;
            task.reminder_notified = false;
        })
    }

    pub fn mark_reminder_notified(&mut self, id: TaskId) -> bool {
        self.update_task(id, |task| task.reminder_notified = true)
    }

    pub fn rename_task(&mut self, id: TaskId, title: &str) -> bool {
        let title = title.trim();
        if title.is_empty() {
            return false;
        }
        self.update_task(id, |task| task.title = title.to_string())
    }

    pub fn set_note(&mut self, id: TaskId, note: Option<String>) -> bool {
        let now = self.clock.now();
        self.update_task(id, |task| {
            task.note = note;
            task.note_modified_at = Some(now);
        })
    }

    /// Move a task into a live project, or back to the Inbox with `None`.
    pub fn move_task_to_project(&mut self, id: TaskId, project_id: Option<ProjectId>) -> bool {
        if let Some(pid) = project_id {
            if !self.project(pid).is_some_and(|p| !p.deleted) {
                return false;
            }
        }
        self.update_task(id, |task| task.project_id = project_id)
    }

    /// Apply an arbitrary edit to one task and persist it.
    pub fn update_task<F>(&mut self, id: TaskId, edit: F) -> bool
    where
        F: FnOnce(&mut Task),
    {
        let Some(task) = self.task_mut(id) else {
            return false;
        };
        edit(task);
        self.commit();
        true
    }

    /// Remove a task and hand it back.
    pub fn delete_task(&mut self, id: TaskId) -> Option<Task> {
        let pos = self.data.tasks.iter().position(|t| t.id == id)?;
        let task = self.data.tasks.remove(pos);
        debug!(%id, "Deleted task");
        self.commit();
        Some(task)
    }

    /// Put a previously removed task back near its old position.
    /// Does nothing if a task with the same id is present.
    pub fn restore_task(&mut self, task: Task) -> bool {
        if self.task(task.id).is_some() {
            return false;
        }
        let pos = self
            .data
            .tasks
            .iter()
            .position(|t| t.order > task.order)
            .unwrap_or(self.data.tasks.len());
        self.data.tasks.insert(pos, task);
        self.commit();
        true
    }

    /// Move a task to `new_index` in the backing list and renumber every
    /// task's `order` to its position.
    pub fn reorder_task(&mut self, id: TaskId, new_index: usize) -> bool {
        let Some(old_index) = self.data.tasks.iter().position(|t| t.id == id) else {
            return false;
        };
        if old_index == new_index {
            return false;
        }

        let task = self.data.tasks.remove(old_index);
        let new_index = new_index.min(self.data.tasks.len());
        self.data.tasks.insert(new_index, task);
        for (i, task) in self.data.tasks.iter_mut().enumerate() {
            task.order = i;
        }
        self.commit();
        true
    }

    // Subtasks

    pub fn add_subtask(&mut self, task_id: TaskId, title: &str) -> Option<SubTaskId> {
        let title = title.trim();
        if title.is_empty() {
            return None;
        }
        let task = self.task_mut(task_id)?;
        let subtask = SubTask::new(title, task.subtasks.len());
        let id = subtask.id;
        task.subtasks.push(subtask);
        self.commit();
        Some(id)
    }

    /// Returns the subtask's new completion flag.
    pub fn toggle_subtask(&mut self, task_id: TaskId, subtask_id: SubTaskId) -> Option<bool> {
        let subtask = self
            .task_mut(task_id)?
            .subtasks
            .iter_mut()
            .find(|s| s.id == subtask_id)?;
        subtask.completed = !subtask.completed;
        let completed = subtask.completed;
        self.commit();
        Some(completed)
    }

    pub fn remove_subtask(&mut self, task_id: TaskId, subtask_id: SubTaskId) -> bool {
        let Some(task) = self.task_mut(task_id) else {
            return false;
        };
        let before = task.subtasks.len();
        task.subtasks.retain(|s| s.id != subtask_id);
        if task.subtasks.len() == before {
            return false;
        }
        self.commit();
        true
    }

    // Projects

    pub fn project(&self, id: ProjectId) -> Option<&Project> {
        self.data.projects.iter().find(|p| p.id == id)
    }

    /// Live projects in display order.
    pub fn projects(&self) -> Vec<&Project> {
        let mut projects: Vec<&Project> = self.data.projects.iter().filter(|p| !p.deleted).collect();
        projects.sort_by_key(|p| p.order);
        projects
    }

    /// Soft-deleted projects awaiting restore or purge.
    pub fn deleted_projects(&self) -> Vec<&Project> {
        self.data.projects.iter().filter(|p| p.deleted).collect()
    }

    pub fn project_by_name(&self, name: &str) -> Option<&Project> {
        let name = name.trim().to_lowercase();
        self.data
            .projects
            .iter()
            .find(|p| p.name.to_lowercase() == name)
    }

    /// Incomplete tasks in a project.
    pub fn project_task_count(&self, id: ProjectId) -> usize {
        self.data
            .tasks
            .iter()
            .filter(|t| t.project_id == Some(id) && !t.completed)
            .count()
    }

    pub fn add_project(&mut self, name: &str) -> Option<ProjectId> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        let project = Project::new(name, self.data.projects.len());
        let id = project.id;
        self.data.projects.push(project);
        self.commit();
        Some(id)
    }

    pub fn rename_project(&mut self, id: ProjectId, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        let Some(project) = self.project_mut(id) else {
            return false;
        };
        project.name = name.to_string();
        self.commit();
        true
    }

    /// Soft-delete a project and hard-delete every task in it.
    pub fn delete_project(&mut self, id: ProjectId) -> bool {
        let now = self.clock.now();
        let Some(project) = self.project_mut(id) else {
            return false;
        };
        project.deleted = true;
        project.deleted_at = Some(now);

        let before = self.data.tasks.len();
        self.data.tasks.retain(|t| t.project_id != Some(id));
        info!(%id, removed = before - self.data.tasks.len(), "Deleted project");
        self.commit();
        true
    }

    /// Bring back a soft-deleted project. Its tasks stay deleted.
    pub fn restore_project(&mut self, id: ProjectId) -> bool {
        let Some(project) = self.project_mut(id).filter(|p| p.deleted) else {
            return false;
        };
        project.deleted = false;
        project.deleted_at = None;
        self.commit();
        true
    }

    /// Remove a soft-deleted project for good. Live projects are refused.
    pub fn purge_project(&mut self, id: ProjectId) -> bool {
        let Some(pos) = self
            .data
            .projects
            .iter()
            .position(|p| p.id == id && p.deleted)
        else {
            return false;
        };
        self.data.projects.remove(pos);
        self.commit();
        true
    }

    /// Drop `dragged` at `target`'s position among live projects, then
    /// renumber them.
    pub fn reorder_project(&mut self, dragged: ProjectId, target: ProjectId) -> bool {
        if dragged == target {
            return false;
        }

        let mut ids: Vec<ProjectId> = self.projects().iter().map(|p| p.id).collect();
        let (Some(old_index), Some(new_index)) = (
            ids.iter().position(|&id| id == dragged),
            ids.iter().position(|&id| id == target),
        ) else {
            return false;
        };

        let id = ids.remove(old_index);
        ids.insert(new_index, id);
        for (order, id) in ids.into_iter().enumerate() {
            if let Some(project) = self.project_mut(id) {
                project.order = order;
            }
        }
        self.commit();
        true
    }

    // Tags

    pub fn tag(&self, id: TagId) -> Option<&Tag> {
        self.data.tags.iter().find(|t| t.id == id)
    }

    pub fn tag_by_name(&self, name: &str) -> Option<&Tag> {
        let name = name.trim().to_lowercase();
        self.data.tags.iter().find(|t| t.name.to_lowercase() == name)
    }

    /// All tags in display order, hidden ones included.
    pub fn tags(&self) -> Vec<&Tag> {
        let mut tags: Vec<&Tag> = self.data.tags.iter().collect();
        tags.sort_by_key(|t| t.order);
        tags
    }

    pub fn visible_tags(&self) -> Vec<&Tag> {
        let mut tags = self.tags();
        tags.retain(|t| !t.hidden);
        tags
    }

    /// Incomplete tasks carrying a tag.
    pub fn tag_task_count(&self, id: TagId) -> usize {
        self.data
            .tasks
            .iter()
            .filter(|t| !t.completed && t.has_tag(id))
            .count()
    }

    /// Colour of the task's first tag, if any.
    pub fn first_tag_color(&self, task: &Task) -> Option<&str> {
        let first = task.tag_ids.first()?;
        self.tag(*first).map(|t| t.color.as_str())
    }

    fn find_or_create_tag(&mut self, name: &str, color: Option<&str>) -> Option<TagId> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        if let Some(tag) = self.tag_by_name(name) {
            return Some(tag.id);
        }

        let count = self.data.tags.len();
        let color = color.unwrap_or_else(|| Tag::palette_color(count));
        let tag = Tag::new(name, color, count);
        let id = tag.id;
        self.data.tags.push(tag);
        Some(id)
    }

    /// Create a tag, or return the existing one with the same name.
    pub fn add_tag(&mut self, name: &str, color: Option<&str>) -> Option<TagId> {
        let count = self.data.tags.len();
        let id = self.find_or_create_tag(name, color)?;
        if self.data.tags.len() > count {
            self.commit();
        }
        Some(id)
    }

    pub fn rename_tag(&mut self, id: TagId, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() {
            return false;
        }
        let Some(tag) = self.tag_mut(id) else {
            return false;
        };
        tag.name = name.to_string();
        self.commit();
        true
    }

    pub fn set_tag_color(&mut self, id: TagId, color: &str) -> bool {
        let Some(tag) = self.tag_mut(id) else {
            return false;
        };
        tag.color = color.to_string();
        self.commit();
        true
    }

    fn set_tag_hidden(&mut self, id: TagId, hidden: bool) -> bool {
        let Some(tag) = self.tag_mut(id) else {
            return false;
        };
        tag.hidden = hidden;
        self.commit();
        true
    }

    pub fn hide_tag(&mut self, id: TagId) -> bool {
        self.set_tag_hidden(id, true)
    }

    pub fn unhide_tag(&mut self, id: TagId) -> bool {
        self.set_tag_hidden(id, false)
    }

    /// Detach a tag from every task, then remove it.
    pub fn delete_tag(&mut self, id: TagId) -> bool {
        let Some(pos) = self.data.tags.iter().position(|t| t.id == id) else {
            return false;
        };
        for task in &mut self.data.tasks {
            task.tag_ids.retain(|&t| t != id);
        }
        self.data.tags.remove(pos);
        self.commit();
        true
    }

    pub fn add_tag_to_task(&mut self, task_id: TaskId, tag_id: TagId) -> bool {
        if self.tag(tag_id).is_none() {
            return false;
        }
        let Some(task) = self.task_mut(task_id) else {
            return false;
        };
        if task.has_tag(tag_id) {
            return false;
        }
        task.tag_ids.push(tag_id);
        self.commit();
        true
    }

    pub fn remove_tag_from_task(&mut self, task_id: TaskId, tag_id: TagId) -> bool {
        let Some(task) = self.task_mut(task_id) else {
            return false;
        };
        if !task.has_tag(tag_id) {
            return false;
        }
        task.tag_ids.retain(|&t| t != tag_id);
        self.commit();
        true
    }

    // Pet, settings, whole-aggregate

    pub fn pet_status(&self) -> &PetStatus {
        &self.data.pet_status
    }

    /// Reset the pet's daily counters on a new day. Returns true if reset.
    pub fn roll_pet_day(&mut self) -> bool {
        let today = self.today();
        if !self.data.pet_status.roll_day(today) {
            return false;
        }
        self.commit();
        true
    }

    /// Edit the pet state and persist it.
    pub fn update_pet_status<F>(&mut self, edit: F)
    where
        F: FnOnce(&mut PetStatus),
    {
        edit(&mut self.data.pet_status);
        self.commit();
    }

    pub fn set_dark_mode(&mut self, dark_mode: bool) {
        self.data.dark_mode = dark_mode;
        self.commit();
    }

    /// Swap in a whole new aggregate (import or reset) and save it.
    pub fn replace_data(&mut self, data: AppData) -> bool {
        info!(tasks = data.tasks.len(), "Replacing all data");
        self.data = data;
        self.commit()
    }

    pub fn delete_all_backups(&self) {
        self.storage.delete_all_backups();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn setup() -> (TempDir, Arc<FixedClock>, TaskEngine) {
        let dir = tempfile::tempdir().unwrap();
        let clock = Arc::new(FixedClock::at_date(date(2024, 1, 10)));
        let storage = Storage::open(dir.path(), clock.clone());
        let engine = TaskEngine::new(storage, clock.clone());
        (dir, clock, engine)
    }

    fn titles(tasks: &[&Task]) -> Vec<String> {
        tasks.iter().map(|t| t.title.clone()).collect()
    }

    #[test]
    fn test_add_task_parses_date_and_tags() {
        let (_dir, _clock, mut engine) = setup();
        let id = engine.add_task("내일 장보기 #집안일 #shopping", None);

        let task = engine.task(id).unwrap();
        assert_eq!(task.title, "장보기");
        assert_eq!(task.due_date, Some(date(2024, 1, 11)));
        assert_eq!(task.tag_ids.len(), 2);
        assert_eq!(task.order, 0);

        let names: Vec<_> = engine.tags().iter().map(|t| t.name.clone()).collect();
        assert_eq!(names, vec!["집안일", "shopping"]);
        assert_eq!(engine.data().statistics.daily_history[0].created, 1);
    }

    #[test]
    fn test_add_task_reuses_tags_case_insensitively() {
        let (_dir, _clock, mut engine) = setup();
        let first = engine.add_task("a #Work", None);
        let second = engine.add_task("b #work", None);

        assert_eq!(engine.tags().len(), 1);
        assert_eq!(engine.task(first).unwrap().tag_ids, engine.task(second).unwrap().tag_ids);
        assert_eq!(engine.task(second).unwrap().order, 1);
    }

    #[test]
    fn test_toggle_complete_counts_and_reopen_does_not_decrement() {
        let (_dir, clock, mut engine) = setup();
        let id = engine.add_task("Write report", None);

        let outcome = engine.toggle_complete(id).unwrap();
        assert!(outcome.completed);
        assert!(outcome.first_today);
        let task = engine.task(id).unwrap();
        assert!(task.completed);
        assert_eq!(task.completed_at, Some(clock.now()));
        assert_eq!(engine.pet_status().total_completed, 1);
        assert_eq!(engine.data().statistics.current_streak, 1);

        let outcome = engine.toggle_complete(id).unwrap();
        assert!(!outcome.completed);
        assert_eq!(engine.task(id).unwrap().completed_at, None);
        assert_eq!(engine.pet_status().total_completed, 1);
        assert_eq!(engine.pet_status().today_completed, 1);
        assert_eq!(engine.data().statistics.completed_on(clock.today()), 1);
    }

    #[test]
    fn test_level_up_on_tenth_completion() {
        let (_dir, _clock, mut engine) = setup();
        let ids: Vec<_> = (0..10).map(|i| engine.add_task(&format!("t{i}"), None)).collect();

        for id in &ids[..9] {
            assert!(!engine.toggle_complete(*id).unwrap().leveled_up);
        }
        let outcome = engine.toggle_complete(ids[9]).unwrap();
        assert!(outcome.leveled_up);
        assert!(!outcome.first_today);
        assert_eq!(engine.pet_status().level, 2);
    }

    #[test]
    fn test_recurring_completion_spawns_successor() {
        let (_dir, _clock, mut engine) = setup();
        let id = engine.add_task("Water plants 오늘", None);
        engine.set_recurrence(id, Recurrence::Weekly, 0);
        assert_eq!(engine.task(id).unwrap().recurrence_interval, 1);

        let outcome = engine.toggle_complete(id).unwrap();
        let next_id = outcome.spawned.unwrap();
        let next = engine.task(next_id).unwrap();
        assert_eq!(next.title, "Water plants");
        assert_eq!(next.due_date, Some(date(2024, 1, 17)));
        assert!(!next.completed);
        assert_eq!(next.order, 1);
        assert_eq!(engine.tasks().len(), 2);
    }

    #[test]
    fn test_today_view_and_sort() {
        let (_dir, _clock, mut engine) = setup();
        let later = engine.add_task("later", None);
        engine.set_due_date(later, Some(date(2024, 1, 12)));
        let late = engine.add_task("late", None);
        engine.set_due_date(late, Some(date(2024, 1, 5)));
        let pinned = engine.add_task("pinned", None);
        engine.toggle_pinned_today(pinned);
        let urgent = engine.add_task("urgent", None);
        engine.set_due_date(urgent, Some(date(2024, 1, 10)));
        engine.toggle_important(urgent);
        let project = engine.add_project("Work").unwrap();
        engine.add_task("in project 오늘", Some(project));

        let today = engine.today_tasks(false);
        assert_eq!(titles(&today), vec!["urgent", "late", "pinned"]);
        assert_eq!(engine.today_task_count(), 3);
        assert!(engine.has_overdue_tasks());

        let upcoming = engine.upcoming_tasks(false);
        assert_eq!(titles(&upcoming), vec!["later"]);
    }

    #[test]
    fn test_completed_tasks_are_filtered_and_sorted_last() {
        let (_dir, _clock, mut engine) = setup();
        let done = engine.add_task("done", None);
        engine.add_task("open", None);
        engine.toggle_complete(done);

        assert_eq!(titles(&engine.inbox_tasks(false)), vec!["open"]);
        assert_eq!(titles(&engine.inbox_tasks(true)), vec!["open", "done"]);
    }

    #[test]
    fn test_week_and_unscheduled_views() {
        let (_dir, _clock, mut engine) = setup();
        let a = engine.add_task("a", None);
        engine.set_due_date(a, Some(date(2024, 1, 14)));
        let b = engine.add_task("b", None);
        engine.set_due_date(b, Some(date(2024, 1, 8)));
        let c = engine.add_task("c", None);
        engine.set_due_date(c, Some(date(2024, 1, 20)));
        engine.add_task("d", None);

        let week = engine.week_tasks(date(2024, 1, 8), date(2024, 1, 14), false);
        assert_eq!(titles(&week), vec!["b", "a"]);
        assert_eq!(titles(&engine.unscheduled_tasks(false)), vec!["d"]);
    }

    #[test]
    fn test_search_requires_every_term() {
        let (_dir, _clock, mut engine) = setup();
        engine.add_task("Buy Milk and eggs", None);
        engine.add_task("Buy bread", None);

        assert_eq!(titles(&engine.search("milk BUY", false)), vec!["Buy Milk and eggs"]);
        assert_eq!(engine.search("buy", false).len(), 2);
        assert!(engine.search("   ", false).is_empty());
    }

    #[test]
    fn test_reorder_renumbers_every_task() {
        let (_dir, _clock, mut engine) = setup();
        let ids: Vec<_> = (0..5).map(|i| engine.add_task(&format!("t{i}"), None)).collect();

        assert!(engine.reorder_task(ids[2], 0));
        let order: Vec<_> = engine.tasks().iter().map(|t| (t.title.clone(), t.order)).collect();
        assert_eq!(
            order,
            vec![
                ("t2".to_string(), 0),
                ("t0".to_string(), 1),
                ("t1".to_string(), 2),
                ("t3".to_string(), 3),
                ("t4".to_string(), 4),
            ]
        );
        assert!(!engine.reorder_task(ids[2], 0));
    }

    #[test]
    fn test_delete_and_restore_task() {
        let (_dir, _clock, mut engine) = setup();
        let ids: Vec<_> = (0..3).map(|i| engine.add_task(&format!("t{i}"), None)).collect();

        let removed = engine.delete_task(ids[1]).unwrap();
        assert_eq!(engine.tasks().len(), 2);
        assert!(engine.restore_task(removed.clone()));
        assert!(!engine.restore_task(removed));
        let order: Vec<_> = engine.tasks().iter().map(|t| t.id).collect();
        assert_eq!(order, ids);
    }

    #[test]
    fn test_delete_project_removes_its_tasks_for_good() {
        let (_dir, clock, mut engine) = setup();
        let project = engine.add_project("Home").unwrap();
        engine.add_task("mop", Some(project));
        engine.add_task("dust", Some(project));
        engine.add_task("inbox", None);
        assert_eq!(engine.project_task_count(project), 2);

        assert!(engine.delete_project(project));
        assert_eq!(engine.tasks().len(), 1);
        assert!(engine.projects().is_empty());
        let deleted = engine.deleted_projects();
        assert_eq!(deleted.len(), 1);
        assert_eq!(deleted[0].deleted_at, Some(clock.now()));

        assert!(engine.restore_project(project));
        assert_eq!(engine.projects().len(), 1);
        assert!(engine.project_tasks(project, true).is_empty());
        assert_eq!(engine.tasks().len(), 1);
    }

    #[test]
    fn test_purge_and_reorder_projects() {
        let (_dir, _clock, mut engine) = setup();
        let a = engine.add_project("A").unwrap();
        let b = engine.add_project("B").unwrap();
        let c = engine.add_project("C").unwrap();

        assert!(engine.reorder_project(c, a));
        let names: Vec<_> = engine.projects().iter().map(|p| p.name.clone()).collect();
        assert_eq!(names, vec!["C", "A", "B"]);

        assert!(!engine.purge_project(b));
        engine.delete_project(b);
        assert!(engine.purge_project(b));
        assert!(engine.project(b).is_none());
        assert_eq!(engine.project_by_name("c").map(|p| p.id), Some(c));
    }

    #[test]
    fn test_purge_keeps_live_projects_and_their_tasks() {
        let (_dir, _clock, mut engine) = setup();
        let project = engine.add_project("Work").unwrap();
        engine.add_task("quarterly report 오늘", Some(project));

        assert!(!engine.purge_project(project));
        assert_eq!(engine.project_tasks(project, false).len(), 1);

        engine.delete_project(project);
        assert!(engine.purge_project(project));
        assert!(engine.tasks().is_empty());
        assert!(engine.deleted_projects().is_empty());
    }

    #[test]
    fn test_add_task_to_dead_project_lands_in_inbox() {
        let (_dir, _clock, mut engine) = setup();
        let project = engine.add_project("Old").unwrap();
        engine.delete_project(project);

        let ghost = engine.add_task("ghost", Some(project));
        assert_eq!(engine.task(ghost).unwrap().project_id, None);
        assert_eq!(titles(&engine.inbox_tasks(false)), vec!["ghost"]);

        let stray = engine.add_task("stray", Some(ProjectId::new_v4()));
        assert_eq!(engine.task(stray).unwrap().project_id, None);
    }

    #[test]
    fn test_move_task_requires_live_project() {
        let (_dir, _clock, mut engine) = setup();
        let task = engine.add_task("file me", None);
        let project = engine.add_project("Work").unwrap();

        assert!(engine.move_task_to_project(task, Some(project)));
        assert!(engine.inbox_tasks(false).is_empty());
        assert!(engine.move_task_to_project(task, None));

        engine.delete_project(project);
        assert!(!engine.move_task_to_project(task, Some(project)));
    }

    #[test]
    fn test_delete_tag_cleans_tasks() {
        let (_dir, _clock, mut engine) = setup();
        let task = engine.add_task("t #a #b", None);
        let a = engine.tag_by_name("a").unwrap().id;
        let b = engine.tag_by_name("B").unwrap().id;

        assert_eq!(engine.first_tag_color(engine.task(task).unwrap()), Some("#E74C3C"));
        assert!(engine.delete_tag(a));
        assert_eq!(engine.task(task).unwrap().tag_ids, vec![b]);
        assert_eq!(engine.tags().len(), 1);
    }

    #[test]
    fn test_tag_management() {
        let (_dir, _clock, mut engine) = setup();
        let tag = engine.add_tag("errand", Some("#000000")).unwrap();
        assert_eq!(engine.add_tag("ERRAND", None), Some(tag));
        assert_eq!(engine.add_tag("  ", None), None);

        let task = engine.add_task("post office", None);
        assert!(engine.add_tag_to_task(task, tag));
        assert!(!engine.add_tag_to_task(task, tag));
        assert_eq!(engine.tag_task_count(tag), 1);
        assert_eq!(engine.tag_tasks(tag, false).len(), 1);

        assert!(engine.hide_tag(tag));
        assert!(engine.visible_tags().is_empty());
        assert!(engine.unhide_tag(tag));
        assert_eq!(engine.visible_tags().len(), 1);

        assert!(engine.rename_tag(tag, "chores"));
        assert!(engine.set_tag_color(tag, "#FFFFFF"));
        assert_eq!(engine.tag(tag).unwrap().color, "#FFFFFF");

        assert!(engine.remove_tag_from_task(task, tag));
        assert!(!engine.remove_tag_from_task(task, tag));
    }

    #[test]
    fn test_subtasks() {
        let (_dir, _clock, mut engine) = setup();
        let task = engine.add_task("pack", None);
        let socks = engine.add_subtask(task, "socks").unwrap();
        engine.add_subtask(task, "shirts").unwrap();
        assert!(engine.add_subtask(task, " ").is_none());

        assert_eq!(engine.toggle_subtask(task, socks), Some(true));
        assert_eq!(engine.task(task).unwrap().subtask_progress(), (1, 2));

        assert!(engine.remove_subtask(task, socks));
        assert!(!engine.remove_subtask(task, socks));
        assert_eq!(engine.task(task).unwrap().subtasks[0].title, "shirts");
    }

    #[test]
    fn test_reminders_fire_once() {
        let (_dir, clock, mut engine) = setup();
        let task = engine.add_task("call", None);
        engine.set_reminder(task, Some(clock.now() + chrono::Duration::minutes(5)));
        assert!(engine.pending_reminders().is_empty());

        clock.set(clock.now() + chrono::Duration::minutes(10));
        assert_eq!(engine.pending_reminders().len(), 1);
        assert!(engine.mark_reminder_notified(task));
        assert!(engine.pending_reminders().is_empty());

        engine.set_reminder(task, Some(clock.now()));
        assert_eq!(engine.pending_reminders().len(), 1);
    }

    #[test]
    fn test_edits_persist_across_reload() {
        let (dir, clock, mut engine) = setup();
        let task = engine.add_task("draft", None);
        engine.rename_task(task, "final");
        engine.set_note(task, Some("<p>notes</p>".to_string()));
        engine.set_dark_mode(true);
        drop(engine);

        let engine = TaskEngine::new(Storage::open(dir.path(), clock.clone()), clock.clone());
        let reloaded = engine.task(task).unwrap();
        assert_eq!(reloaded.title, "final");
        assert!(reloaded.has_note());
        assert_eq!(reloaded.note_modified_at, Some(clock.now()));
        assert!(engine.data().dark_mode);
    }

    #[test]
    fn test_subscribers_hear_after_save() {
        let (_dir, _clock, mut engine) = setup();
        let rx = engine.subscribe();
        let dropped = engine.subscribe();
        drop(dropped);

        engine.add_task("hello", None);
        assert_eq!(rx.try_recv(), Ok(DataChanged { persisted: true }));
        assert!(rx.try_recv().is_err());
        assert_eq!(engine.subscribers.len(), 1);
    }

    #[test]
    fn test_replace_data_and_roll_day() {
        let (_dir, clock, mut engine) = setup();
        engine.add_task("old", None);
        assert!(engine.replace_data(AppData::default()));
        assert!(engine.tasks().is_empty());

        assert!(engine.roll_pet_day());
        assert!(!engine.roll_pet_day());
        clock.advance_days(1);
        assert!(engine.roll_pet_day());
    }
}
