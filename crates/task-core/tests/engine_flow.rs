//! End-to-end flows through storage, engine and undo history.

use chrono::NaiveDate;
use std::fs;
use std::sync::Arc;
use task_core::{
    greet, AppData, Clock, FixedClock, Greeting, Storage, Task, TaskEngine, UndoLog,
    MAX_IMPORT_TASKS,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn open(dir: &std::path::Path, clock: &Arc<FixedClock>) -> TaskEngine {
    TaskEngine::new(Storage::open(dir, clock.clone()), clock.clone())
}

#[test]
fn test_week_of_use_survives_restart_and_corruption() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(FixedClock::at_date(date(2024, 1, 10)));

    let mut engine = open(dir.path(), &clock);
    let rent = engine.add_task("내일 pay rent #bills", None);
    let milk = engine.add_task("buy milk", None);
    engine.toggle_complete(milk);

    clock.advance_days(1);
    engine.toggle_complete(rent);
    assert_eq!(engine.data().statistics.current_streak, 2);
    drop(engine);

    // A crash mid-write leaves garbage behind; the daily backup still holds
    // the state from before the second day's first save.
    fs::write(dir.path().join("data.json"), "{\"tasks\": [").unwrap();
    let engine = open(dir.path(), &clock);
    assert_eq!(engine.tasks().len(), 2);
    assert!(engine.task(milk).unwrap().completed);
    assert!(!engine.task(rent).unwrap().completed);
    assert_eq!(engine.tags().len(), 1);
}

#[test]
fn test_export_import_replaces_everything() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(FixedClock::at_date(date(2024, 1, 10)));

    let mut source = open(dir.path(), &clock);
    source.add_task("alpha", None);
    let project = source.add_project("Side project").unwrap();
    source.add_task("beta", Some(project));
    let export_path = dir.path().join("export.json");
    assert!(source.storage().export_to_file(source.data(), &export_path));
    drop(source);

    let other = tempfile::tempdir().unwrap();
    let mut target = open(other.path(), &clock);
    target.add_task("to be replaced", None);

    let imported = target.storage().import_from_file(&export_path).unwrap();
    assert!(target.replace_data(imported));
    let titles: Vec<_> = target.all_tasks(true).iter().map(|t| t.title.clone()).collect();
    assert_eq!(titles, vec!["alpha", "beta"]);
    assert_eq!(target.projects().len(), 1);
}

#[test]
fn test_reset_clears_data_and_backups() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(FixedClock::at_date(date(2024, 1, 10)));
    let mut engine = open(dir.path(), &clock);
    engine.add_task("one", None);
    engine.add_task("two", None);
    assert!(!engine.storage().available_backups().is_empty());

    engine.replace_data(AppData::default());
    engine.delete_all_backups();
    assert!(engine.tasks().is_empty());
    assert!(engine.storage().available_backups().is_empty());
}

#[test]
fn test_oversized_import_leaves_engine_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(FixedClock::at_date(date(2024, 1, 10)));
    let mut engine = open(dir.path(), &clock);
    engine.add_task("keep me", None);

    let created_at = clock.now();
    let mut big = AppData::default();
    big.tasks = (0..=MAX_IMPORT_TASKS)
        .map(|_| Task::new("bulk", created_at))
        .collect();
    let json = engine.storage().export(&big).unwrap();

    assert!(engine.storage().import(&json).is_none());
    assert_eq!(engine.tasks().len(), 1);
}

#[test]
fn test_session_with_undo_and_greeting() {
    let dir = tempfile::tempdir().unwrap();
    let clock = Arc::new(FixedClock::at_date(date(2024, 1, 10)));
    let mut engine = open(dir.path(), &clock);
    let mut history = UndoLog::new();
    let changes = engine.subscribe();

    assert_eq!(greet(&mut engine), Some(Greeting::Daily));

    let task = history.add_task(&mut engine, "write letter 오늘");
    history.toggle_complete(&mut engine, task).unwrap();
    assert_eq!(engine.today_task_count(), 0);

    // Next day: yesterday's list was cleared.
    clock.advance_days(1);
    assert_eq!(greet(&mut engine), Some(Greeting::YesterdayPraise));
    assert!(engine.roll_pet_day());
    assert_eq!(engine.pet_status().today_completed, 0);

    assert!(history.undo(&mut engine).is_some());
    assert!(!engine.task(task).unwrap().completed);
    assert_eq!(engine.today(), clock.today());
    assert!(changes.try_iter().count() >= 5);
}
