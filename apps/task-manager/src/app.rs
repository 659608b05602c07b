//! Application state and command handling.

use crate::config::Config;
use anyhow::{bail, Context as _, Result};
use chrono::{Datelike, Days, NaiveDate, NaiveDateTime};
use std::path::Path;
use std::sync::mpsc::Receiver;
use task_core::{
    completion_reaction, current_mood, date_change_description, greet, parse, AppData,
    DataChanged, Mood, ProjectId, Recurrence, TagId, Task, TaskEngine, TaskId, UiSettings,
    UndoLog,
};
use tracing::{info, warn};

const HELP: &str = "\
Tasks:     add <text> | done N | star N | pin N | due N <when|none> | rm N
           rename N <title> | note N <text|none> | mv N <project|inbox> | move N M
           repeat N <none|daily|weekly|monthly|yearly> [every] | remind N <YYYY-MM-DD HH:MM|none>
           sub N <title> | subdone N M | subrm N M
Views:     ls [inbox|today|upcoming|week|unscheduled|all] | project <name> | tag <name> | search <terms>
Projects:  projects | newproject <name> | renameproject <old> -> <new> | delproject <name>
           restoreproject <name> | purgeproject <name> | reorderproject <name> -> <target>
Tags:      tags | newtag <name> [#color] | renametag <old> -> <new> | tagcolor <name> <#color>
           hidetag <name> | unhidetag <name> | deltag <name> | tagadd N <name> | tagrm N <name>
History:   undo | redo
Data:      stats | export <path> | import <path> | backups | restorebackup N | reset
Other:     sidebar | fold <projects|tags> | dark <on|off> | completed | mood | help | quit";

/// Whether the command loop should keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Inbox,
    Today,
    Upcoming,
    Week,
    Unscheduled,
    All,
    Project(ProjectId),
    Tag(TagId),
}

pub struct App {
    engine: TaskEngine,
    history: UndoLog,
    changes: Receiver<DataChanged>,
    ui: UiSettings,
    date_format: String,
    show_completed: bool,
    /// Task ids in the order of the last listing, for `N` arguments.
    listed: Vec<TaskId>,
    /// Confirmations still needed before a reset runs.
    pending_reset: u8,
    messages: Vec<String>,
}

fn split_arg(input: &str) -> (&str, &str) {
    match input.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (input, ""),
    }
}

fn split_arrow(input: &str) -> Result<(&str, &str)> {
    input
        .split_once("->")
        .map(|(a, b)| (a.trim(), b.trim()))
        .filter(|(a, b)| !a.is_empty() && !b.is_empty())
        .context("expected `<name> -> <name>`")
}

fn parse_recurrence(word: &str) -> Result<Recurrence> {
    Ok(match word.to_lowercase().as_str() {
        "none" | "off" => Recurrence::None,
        "daily" => Recurrence::Daily,
        "weekly" => Recurrence::Weekly,
        "monthly" => Recurrence::Monthly,
        "yearly" => Recurrence::Yearly,
        other => bail!("unknown recurrence: {other}"),
    })
}

fn heat_char(intensity: u8) -> char {
    match intensity {
        0 => '.',
        1 => ':',
        2 => '-',
        3 => '=',
        _ => '#',
    }
}

impl App {
    pub fn new(mut engine: TaskEngine, config: &Config) -> Self {
        let changes = engine.subscribe();
        let ui = engine.storage().load_ui_settings();
        Self {
            engine,
            history: UndoLog::new(),
            changes,
            ui,
            date_format: config.display.date_format.clone(),
            show_completed: config.display.show_completed,
            listed: Vec::new(),
            pending_reset: 0,
            messages: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn engine(&self) -> &TaskEngine {
        &self.engine
    }

    pub fn take_messages(&mut self) -> Vec<String> {
        std::mem::take(&mut self.messages)
    }

    fn say(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    /// Greeting first, then the pet's daily reset, then today's list.
    pub fn start_session(&mut self) {
        if let Some(greeting) = greet(&mut self.engine) {
            self.say(greeting.message());
        }
        self.engine.roll_pet_day();
        self.show(View::Today);
        self.drain_changes();
    }

    /// Report reminders that came due and mark them notified.
    pub fn scan_reminders(&mut self) {
        let due: Vec<(TaskId, String)> = self
            .engine
            .pending_reminders()
            .into_iter()
            .map(|t| (t.id, t.title.clone()))
            .collect();

        for (id, title) in due {
            info!(%id, "Reminder due");
            self.say(format!("Reminder: {title}"));
            self.engine.mark_reminder_notified(id);
        }
        self.drain_changes();
    }

    /// Warn once per command if any save in it failed.
    fn drain_changes(&mut self) {
        let failed = self.changes.try_iter().any(|c| !c.persisted);
        if failed {
            self.say("warning: changes could not be saved to disk");
        }
    }

    pub fn execute(&mut self, line: &str) -> Result<Control> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Control::Continue);
        }

        if self.pending_reset > 0 {
            self.confirm_reset(line);
            return Ok(Control::Continue);
        }

        let (command, rest) = split_arg(line);
        let result = self.dispatch(command, rest);
        self.drain_changes();
        result
    }

    fn dispatch(&mut self, command: &str, rest: &str) -> Result<Control> {
        match command {
            "quit" | "q" | "exit" => return Ok(Control::Quit),
            "help" | "?" => self.say(HELP),

            "add" | "a" => self.add(rest)?,
            "done" | "x" => self.toggle_done(rest)?,
            "star" => {
                let id = self.task_at(rest)?;
                if let Some(important) = self.history.toggle_important(&mut self.engine, id) {
                    self.say(if important { "Marked important" } else { "Removed important" });
                }
            }
            "pin" => {
                let id = self.task_at(rest)?;
                if let Some(pinned) = self.history.toggle_pinned_today(&mut self.engine, id) {
                    self.say(if pinned { "Pinned to today" } else { "Unpinned from today" });
                }
            }
            "due" => self.set_due(rest)?,
            "rm" | "del" => {
                let id = self.task_at(rest)?;
                if self.history.delete_task(&mut self.engine, id) {
                    self.say("Deleted");
                }
            }
            "rename" => {
                let (n, title) = split_arg(rest);
                let id = self.task_at(n)?;
                if !self.engine.rename_task(id, title) {
                    bail!("title cannot be empty");
                }
            }
            "note" => {
                let (n, text) = split_arg(rest);
                let id = self.task_at(n)?;
                let note = (!text.is_empty() && text != "none").then(|| text.to_string());
                self.engine.set_note(id, note);
            }
            "mv" => self.move_to_project(rest)?,
            "move" => self.reorder(rest)?,
            "repeat" => self.set_repeat(rest)?,
            "remind" => self.set_remind(rest)?,
            "sub" => {
                let (n, title) = split_arg(rest);
                let id = self.task_at(n)?;
                self.engine
                    .add_subtask(id, title)
                    .context("subtask title cannot be empty")?;
            }
            "subdone" | "subrm" => {
                let (n, m) = split_arg(rest);
                let id = self.task_at(n)?;
                let index: usize = m.parse().context("expected a subtask number")?;
                let subtask = self
                    .engine
                    .task(id)
                    .and_then(|t| t.subtasks.get(index.wrapping_sub(1)))
                    .map(|s| s.id)
                    .with_context(|| format!("no subtask #{m}"))?;
                if command == "subdone" {
                    self.engine.toggle_subtask(id, subtask);
                } else {
                    self.engine.remove_subtask(id, subtask);
                }
            }

            "ls" | "list" => {
                let view = match rest {
                    "" | "inbox" => View::Inbox,
                    "today" => View::Today,
                    "upcoming" => View::Upcoming,
                    "week" => View::Week,
                    "unscheduled" => View::Unscheduled,
                    "all" => View::All,
                    other => bail!("unknown view: {other}"),
                };
                self.show(view);
            }
            "project" => {
                let id = self.live_project(rest)?;
                self.show(View::Project(id));
            }
            "tag" => {
                let id = self.tag_named(rest)?;
                self.show(View::Tag(id));
            }
            "search" | "/" => self.search(rest),

            "projects" => self.list_projects(),
            "newproject" => {
                self.engine
                    .add_project(rest)
                    .context("project name cannot be empty")?;
            }
            "renameproject" => {
                let (old, new) = split_arrow(rest)?;
                let id = self.project_named(old)?;
                self.engine.rename_project(id, new);
            }
            "delproject" => {
                let id = self.live_project(rest)?;
                self.engine.delete_project(id);
                self.say("Project deleted with its tasks");
            }
            "restoreproject" => {
                let id = self.project_named(rest)?;
                if !self.engine.restore_project(id) {
                    bail!("project is not deleted");
                }
            }
            "purgeproject" => {
                let id = self.deleted_project(rest)?;
                self.engine.purge_project(id);
            }
            "reorderproject" => {
                let (dragged, target) = split_arrow(rest)?;
                let dragged = self.live_project(dragged)?;
                let target = self.live_project(target)?;
                self.engine.reorder_project(dragged, target);
            }

            "tags" => self.list_tags(),
            "newtag" => {
                let (name, color) = split_arg(rest);
                let color = (!color.is_empty()).then_some(color);
                self.engine
                    .add_tag(name, color)
                    .context("tag name cannot be empty")?;
            }
            "tagcolor" => {
                let (name, color) = split_arg(rest);
                let id = self.tag_named(name)?;
                self.engine.set_tag_color(id, color);
            }
            "renametag" => {
                let (old, new) = split_arrow(rest)?;
                let id = self.tag_named(old)?;
                if !self.engine.rename_tag(id, new.trim_start_matches('#')) {
                    bail!("tag name cannot be empty");
                }
            }
            "hidetag" => {
                let id = self.tag_named(rest)?;
                self.engine.hide_tag(id);
            }
            "unhidetag" => {
                let id = self.tag_named(rest)?;
                self.engine.unhide_tag(id);
            }
            "deltag" => {
                let id = self.tag_named(rest)?;
                self.engine.delete_tag(id);
            }
            "tagadd" | "tagrm" => {
                let (n, name) = split_arg(rest);
                let task = self.task_at(n)?;
                if command == "tagadd" {
                    let tag = self
                        .engine
                        .add_tag(name, None)
                        .context("tag name cannot be empty")?;
                    self.engine.add_tag_to_task(task, tag);
                } else {
                    let tag = self.tag_named(name)?;
                    self.engine.remove_tag_from_task(task, tag);
                }
            }

            "undo" => match self.history.undo(&mut self.engine) {
                Some(message) => self.say(message),
                None => self.say("Nothing to undo"),
            },
            "redo" => match self.history.redo(&mut self.engine) {
                Some(message) => self.say(message),
                None => self.say("Nothing to redo"),
            },

            "stats" => self.stats(),
            "export" => {
                let path = Path::new(rest);
                if !self.engine.storage().export_to_file(self.engine.data(), path) {
                    bail!("export to {} failed", path.display());
                }
                self.say(format!("Exported to {}", path.display()));
            }
            "import" => {
                let data = self
                    .engine
                    .storage()
                    .import_from_file(Path::new(rest))
                    .with_context(|| format!("could not import {rest}"))?;
                self.replace(data);
                self.say("Imported");
            }
            "backups" => {
                let lines: Vec<String> = self
                    .engine
                    .storage()
                    .available_backups()
                    .iter()
                    .enumerate()
                    .map(|(i, b)| format!("{:>3}. {}", i + 1, b.file_name))
                    .collect();
                if lines.is_empty() {
                    self.say("No backups");
                }
                self.messages.extend(lines);
            }
            "restorebackup" => {
                let n: usize = rest.parse().context("expected a backup number")?;
                let backups = self.engine.storage().available_backups();
                let backup = backups
                    .get(n.wrapping_sub(1))
                    .with_context(|| format!("no backup #{n}"))?;
                let data = self
                    .engine
                    .storage()
                    .load_from_backup(&backup.path)
                    .with_context(|| format!("{} is unreadable", backup.file_name))?;
                self.replace(data);
                self.say(format!("Restored {}", backup.file_name));
            }
            "reset" => {
                self.pending_reset = 2;
                self.say("Delete ALL tasks, projects, tags and backups? Type `yes` to continue.");
            }

            "sidebar" => self.sidebar(),
            "fold" => {
                match rest {
                    "projects" => self.ui.projects_expanded = !self.ui.projects_expanded,
                    "tags" => self.ui.tags_expanded = !self.ui.tags_expanded,
                    other => bail!("unknown section: {other}"),
                }
                self.engine.storage().save_ui_settings(&self.ui);
            }
            "dark" => self.engine.set_dark_mode(rest == "on"),
            "completed" => {
                self.show_completed = !self.show_completed;
                self.say(if self.show_completed {
                    "Showing completed tasks"
                } else {
                    "Hiding completed tasks"
                });
            }
            "mood" => {
                let mood = match current_mood(&self.engine) {
                    Mood::Normal => "The pet is content.",
                    Mood::Resting => "The pet is resting. Nothing left for today.",
                    Mood::Worried => "The pet looks worried. Something is overdue.",
                };
                self.say(mood);
            }

            other => bail!("unknown command: {other} (try `help`)"),
        }
        Ok(Control::Continue)
    }

    fn confirm_reset(&mut self, answer: &str) {
        if answer != "yes" {
            self.pending_reset = 0;
            self.say("Reset cancelled");
            return;
        }

        self.pending_reset -= 1;
        if self.pending_reset > 0 {
            self.say("This cannot be undone. Type `yes` again to reset.");
            return;
        }

        warn!("Resetting all data");
        self.replace(AppData::default());
        self.engine.delete_all_backups();
        self.say("All data deleted");
        self.drain_changes();
    }

    fn replace(&mut self, data: AppData) {
        self.engine.replace_data(data);
        self.history.clear();
        self.listed.clear();
    }

    // Argument resolution

    fn task_at(&self, arg: &str) -> Result<TaskId> {
        let n: usize = arg
            .parse()
            .with_context(|| format!("not a task number: {arg:?}"))?;
        n.checked_sub(1)
            .and_then(|i| self.listed.get(i).copied())
            .filter(|id| self.engine.task(*id).is_some())
            .with_context(|| format!("no task #{n} in the last list"))
    }

    fn project_named(&self, name: &str) -> Result<ProjectId> {
        self.engine
            .project_by_name(name)
            .map(|p| p.id)
            .with_context(|| format!("no project named {name:?}"))
    }

    fn deleted_project(&self, name: &str) -> Result<ProjectId> {
        let wanted = name.trim().to_lowercase();
        self.engine
            .deleted_projects()
            .into_iter()
            .find(|p| p.name.to_lowercase() == wanted)
            .map(|p| p.id)
            .with_context(|| format!("no deleted project named {name:?}"))
    }

    fn live_project(&self, name: &str) -> Result<ProjectId> {
        self.engine
            .project_by_name(name)
            .filter(|p| !p.deleted)
            .map(|p| p.id)
            .with_context(|| format!("no project named {name:?}"))
    }

    fn tag_named(&self, name: &str) -> Result<TagId> {
        let name = name.trim_start_matches('#');
        self.engine
            .tag_by_name(name)
            .map(|t| t.id)
            .with_context(|| format!("no tag named {name:?}"))
    }

    /// Parse `due` input: `none`, an ISO date, or any quick-add date phrase.
    fn parse_when(&self, text: &str) -> Result<Option<NaiveDate>> {
        if text.is_empty() || text == "none" {
            return Ok(None);
        }
        if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
            return Ok(Some(date));
        }
        parse(text, self.engine.today())
            .due_date
            .map(Some)
            .with_context(|| format!("not a date: {text:?}"))
    }

    // Commands

    fn add(&mut self, text: &str) -> Result<()> {
        if text.is_empty() {
            bail!("nothing to add");
        }
        let id = self.history.add_task(&mut self.engine, text);
        if let Some(task) = self.engine.task(id) {
            let line = self.format_task(0, task);
            self.say(format!("Added: {}", line.trim_start_matches("  0. ")));
        }
        Ok(())
    }

    fn toggle_done(&mut self, arg: &str) -> Result<()> {
        let id = self.task_at(arg)?;
        let outcome = self
            .history
            .toggle_complete(&mut self.engine, id)
            .context("task disappeared")?;

        match completion_reaction(&outcome, self.engine.pet_status()) {
            Some(reaction) => self.say(reaction.message()),
            None => self.say("Reopened"),
        }
        let next_due = outcome
            .spawned
            .and_then(|id| self.engine.task(id))
            .and_then(|t| t.due_date)
            .map(|d| d.format(&self.date_format).to_string());
        if let Some(due) = next_due {
            self.say(format!("Next occurrence due {due}"));
        }
        Ok(())
    }

    fn set_due(&mut self, rest: &str) -> Result<()> {
        let (n, when) = split_arg(rest);
        let id = self.task_at(n)?;
        let due = self.parse_when(when)?;
        if self.history.set_due_date(&mut self.engine, id, due) {
            let today = self.engine.today();
            self.say(date_change_description(due, today));
        }
        Ok(())
    }

    fn move_to_project(&mut self, rest: &str) -> Result<()> {
        let (n, name) = split_arg(rest);
        let id = self.task_at(n)?;
        let project = match name {
            "inbox" | "" => None,
            name => Some(self.live_project(name)?),
        };
        if !self.engine.move_task_to_project(id, project) {
            bail!("could not move task");
        }
        Ok(())
    }

    /// Move the N-th listed task to just before the M-th listed task.
    fn reorder(&mut self, rest: &str) -> Result<()> {
        let (n, m) = split_arg(rest);
        let id = self.task_at(n)?;
        let target = self.task_at(m)?;
        let position = |id: TaskId| self.engine.tasks().iter().position(|t| t.id == id);
        let (Some(old), Some(mut index)) = (position(id), position(target)) else {
            bail!("task disappeared");
        };
        // The engine inserts after removing, so a downward move shifts by one.
        if old < index {
            index -= 1;
        }
        self.engine.reorder_task(id, index);
        Ok(())
    }

    fn set_repeat(&mut self, rest: &str) -> Result<()> {
        let (n, rule) = split_arg(rest);
        let id = self.task_at(n)?;
        let (kind, every) = split_arg(rule);
        let kind = parse_recurrence(kind)?;
        let every: u32 = if every.is_empty() {
            1
        } else {
            every.parse().context("expected an interval")?
        };
        self.engine.set_recurrence(id, kind, every);
        Ok(())
    }

    fn set_remind(&mut self, rest: &str) -> Result<()> {
        let (n, when) = split_arg(rest);
        let id = self.task_at(n)?;
        let at = if when.is_empty() || when == "none" {
            None
        } else {
            let at = NaiveDateTime::parse_from_str(when, "%Y-%m-%d %H:%M")
                .with_context(|| format!("expected YYYY-MM-DD HH:MM, got {when:?}"))?;
            Some(at)
        };
        self.engine.set_reminder(id, at);
        Ok(())
    }

    // Output

    fn format_task(&self, n: usize, task: &Task) -> String {
        let mut line = format!(
            "{n:>3}. [{}] {}{}",
            if task.completed { 'x' } else { ' ' },
            if task.important { "! " } else { "" },
            task.title
        );

        let today = self.engine.today();
        if let Some(due) = task.due_date {
            let marker = if task.is_overdue(today) { " overdue" } else { "" };
            line.push_str(&format!("  (due {}{marker})", due.format(&self.date_format)));
        }
        if task.pinned_today {
            line.push_str("  *today");
        }
        if let Some(project) = task.project_id.and_then(|id| self.engine.project(id)) {
            line.push_str(&format!("  @{}", project.name));
        }
        for tag in task.tag_ids.iter().filter_map(|id| self.engine.tag(*id)) {
            line.push_str(&format!("  #{}", tag.name));
        }
        let (done, total) = task.subtask_progress();
        if total > 0 {
            line.push_str(&format!("  [{done}/{total}]"));
        }
        if task.recurrence.is_recurring() {
            line.push_str(&format!("  ~{}", task.recurrence.label().to_lowercase()));
        }
        if task.has_note() {
            line.push_str("  +note");
        }
        line
    }

    fn show(&mut self, view: View) {
        let show_completed = self.show_completed;
        let (heading, tasks) = match view {
            View::Inbox => ("Inbox".to_string(), self.engine.inbox_tasks(show_completed)),
            View::Today => ("Today".to_string(), self.engine.today_tasks(show_completed)),
            View::Upcoming => ("Upcoming".to_string(), self.engine.upcoming_tasks(show_completed)),
            View::Week => {
                let today = self.engine.today();
                let start = today - Days::new(u64::from(today.weekday().num_days_from_monday()));
                let end = start + Days::new(6);
                ("This week".to_string(), self.engine.week_tasks(start, end, show_completed))
            }
            View::Unscheduled => (
                "Unscheduled".to_string(),
                self.engine.unscheduled_tasks(show_completed),
            ),
            View::All => ("All tasks".to_string(), self.engine.all_tasks(show_completed)),
            View::Project(id) => (
                self.engine.project(id).map(|p| p.name.clone()).unwrap_or_default(),
                self.engine.project_tasks(id, show_completed),
            ),
            View::Tag(id) => (
                self.engine.tag(id).map(|t| format!("#{}", t.name)).unwrap_or_default(),
                self.engine.tag_tasks(id, show_completed),
            ),
        };

        let ids: Vec<TaskId> = tasks.iter().map(|t| t.id).collect();
        let mut lines = vec![format!("{heading} ({})", tasks.len())];
        lines.extend(tasks.iter().enumerate().map(|(i, t)| self.format_task(i + 1, t)));

        self.listed = ids;
        self.messages.extend(lines);
    }

    fn search(&mut self, query: &str) {
        let tasks = self.engine.search(query, self.show_completed);
        let ids: Vec<TaskId> = tasks.iter().map(|t| t.id).collect();
        let mut lines = vec![format!("Search {query:?} ({})", tasks.len())];
        lines.extend(tasks.iter().enumerate().map(|(i, t)| self.format_task(i + 1, t)));

        self.listed = ids;
        self.messages.extend(lines);
    }

    fn project_lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .engine
            .projects()
            .iter()
            .map(|p| format!("  {} ({})", p.name, self.engine.project_task_count(p.id)))
            .collect();
        lines.extend(
            self.engine
                .deleted_projects()
                .iter()
                .map(|p| format!("  {} (deleted)", p.name)),
        );
        lines
    }

    fn tag_lines(&self, include_hidden: bool) -> Vec<String> {
        let tags = if include_hidden {
            self.engine.tags()
        } else {
            self.engine.visible_tags()
        };
        tags.iter()
            .map(|t| {
                let hidden = if t.hidden { " hidden" } else { "" };
                format!("  #{} {} ({}){hidden}", t.name, t.color, self.engine.tag_task_count(t.id))
            })
            .collect()
    }

    fn list_projects(&mut self) {
        let lines = self.project_lines();
        if lines.is_empty() {
            self.say("No projects");
        }
        self.messages.extend(lines);
    }

    fn list_tags(&mut self) {
        let lines = self.tag_lines(true);
        if lines.is_empty() {
            self.say("No tags");
        }
        self.messages.extend(lines);
    }

    /// Navigation summary honoring the folded sections.
    fn sidebar(&mut self) {
        let mut lines = vec![
            format!("Inbox ({})", self.engine.inbox_tasks(false).len()),
            format!("Today ({})", self.engine.today_task_count()),
            format!("Upcoming ({})", self.engine.upcoming_tasks(false).len()),
        ];
        lines.push(format!(
            "Projects {}",
            if self.ui.projects_expanded { "v" } else { ">" }
        ));
        if self.ui.projects_expanded {
            lines.extend(self.project_lines());
        }
        lines.push(format!("Tags {}", if self.ui.tags_expanded { "v" } else { ">" }));
        if self.ui.tags_expanded {
            lines.extend(self.tag_lines(false));
        }
        self.messages.extend(lines);
    }

    fn stats(&mut self) {
        let today = self.engine.today();
        let pet = self.engine.pet_status();
        let statistics = &self.engine.data().statistics;

        let week: Vec<String> = statistics
            .weekly_completions(today)
            .iter()
            .map(|(date, count)| format!("{} {count}", date.format("%a")))
            .collect();
        let heatmap: String = statistics
            .monthly_heatmap(today)
            .iter()
            .map(|cell| heat_char(cell.intensity))
            .collect();

        let lines = vec![
            format!(
                "Level {} with {} completed ({} today)",
                pet.level, pet.total_completed, pet.today_completed
            ),
            format!(
                "Streak {} days (best {})",
                statistics.current_streak, statistics.best_streak
            ),
            format!("Last 7 days: {}", week.join(" | ")),
            format!("Last 30 days: {heatmap}"),
        ];
        self.messages.extend(lines);
    }
}
