//! Durable JSON storage for [`AppData`].
//!
//! Layout inside the data directory:
//!
//! - `data.json` holds the whole aggregate.
//! - `data.json.tmp` is written first and renamed over `data.json`.
//! - `backups/backup_<YYYY-MM-DD>.json` keeps one snapshot per day for a week.
//! - `.lock` is held exclusively while the app runs.
//! - `ui_settings.json` stores sidebar preferences.
//!
//! Every public operation is best-effort: failures are logged and reported as
//! `bool`/`Option`, never as errors.

use crate::clock::Clock;
use crate::error::{StorageError, StorageResult};
use crate::models::{AppData, UiSettings, CURRENT_SCHEMA_VERSION};
use chrono::{DateTime, Days, Local, NaiveDate};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, info, warn};

pub const DATA_FILE: &str = "data.json";
pub const TEMP_FILE: &str = "data.json.tmp";
pub const BACKUP_DIR: &str = "backups";
pub const LOCK_FILE: &str = ".lock";
pub const UI_SETTINGS_FILE: &str = "ui_settings.json";

/// Daily backups older than this many days are deleted after a save.
pub const BACKUP_RETENTION_DAYS: u64 = 7;
/// Largest import payload accepted, in bytes.
pub const MAX_IMPORT_BYTES: usize = 10_000_000;
/// Largest number of tasks an import may carry.
pub const MAX_IMPORT_TASKS: usize = 10_000;

const BACKUP_PREFIX: &str = "backup_";
const BACKUP_SUFFIX: &str = ".json";

/// A backup file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupInfo {
    pub path: PathBuf,
    pub file_name: String,
    /// Day the snapshot belongs to.
    pub date: NaiveDate,
    pub modified: Option<SystemTime>,
}

/// Owns the on-disk representation of the app data.
pub struct Storage {
    root: PathBuf,
    clock: Arc<dyn Clock>,
    lock: Option<File>,
}

impl Storage {
    /// Use `root` as the data directory, creating it if needed.
    pub fn open(root: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        let storage = Self {
            root: root.into(),
            clock,
            lock: None,
        };
        if let Err(e) = fs::create_dir_all(storage.backup_dir()) {
            warn!(dir = %storage.root.display(), error = %e, "Failed to create data directory");
        }
        storage
    }

    pub fn data_dir(&self) -> &Path {
        &self.root
    }

    pub fn data_path(&self) -> PathBuf {
        self.root.join(DATA_FILE)
    }

    fn temp_path(&self) -> PathBuf {
        self.root.join(TEMP_FILE)
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.root.join(BACKUP_DIR)
    }

    fn lock_path(&self) -> PathBuf {
        self.root.join(LOCK_FILE)
    }

    fn ui_settings_path(&self) -> PathBuf {
        self.root.join(UI_SETTINGS_FILE)
    }

    /// Copy `data.json` from an older data directory, once.
    ///
    /// Does nothing when the legacy file is missing or this directory
    /// already has data. Returns true if a file was copied.
    pub fn migrate_legacy_dir(&self, legacy_dir: &Path) -> bool {
        let legacy_file = legacy_dir.join(DATA_FILE);
        let data_path = self.data_path();
        if !legacy_file.exists() || data_path.exists() {
            return false;
        }

        match fs::copy(&legacy_file, &data_path) {
            Ok(_) => {
                info!(from = %legacy_dir.display(), "Migrated data from legacy directory");
                true
            }
            Err(e) => {
                warn!(from = %legacy_dir.display(), error = %e, "Legacy data migration failed");
                false
            }
        }
    }

    // Single-instance lock

    /// Take the exclusive instance lock. False means another instance holds it.
    pub fn acquire_lock(&mut self) -> bool {
        if self.lock.is_some() {
            return true;
        }

        let result = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.lock_path())
            .and_then(|file| file.try_lock_exclusive().map(|()| file));

        match result {
            Ok(file) => {
                debug!(path = %self.lock_path().display(), "Acquired instance lock");
                self.lock = Some(file);
                true
            }
            Err(e) => {
                warn!(error = %e, "Instance lock is held elsewhere");
                false
            }
        }
    }

    /// Release the instance lock and remove the lock file.
    pub fn release_lock(&mut self) {
        let Some(file) = self.lock.take() else {
            return;
        };
        if let Err(e) = FileExt::unlock(&file) {
            warn!(error = %e, "Failed to unlock instance lock");
        }
        drop(file);
        if let Err(e) = fs::remove_file(self.lock_path()) {
            debug!(error = %e, "Lock file cleanup failed");
        }
    }

    pub fn holds_lock(&self) -> bool {
        self.lock.is_some()
    }

    /// A stale lock file that nobody holds means the last run did not shut
    /// down cleanly. Informational only.
    pub fn previous_session_unclean(&self) -> bool {
        if self.lock.is_some() || !self.lock_path().exists() {
            return false;
        }

        match OpenOptions::new().read(true).write(true).open(self.lock_path()) {
            Ok(file) => match file.try_lock_exclusive() {
                Ok(()) => {
                    let _ = FileExt::unlock(&file);
                    true
                }
                Err(_) => false,
            },
            Err(e) => {
                debug!(error = %e, "Could not inspect lock file");
                false
            }
        }
    }

    // Load / save

    /// Load the aggregate, falling back to the newest readable backup when
    /// `data.json` is unreadable, and to empty data when nothing is.
    pub fn load(&self) -> AppData {
        let data_path = self.data_path();
        if !data_path.exists() {
            debug!("No data file yet, starting empty");
            return AppData::default();
        }

        match read_app_data(&data_path) {
            Ok(data) => migrate(data),
            Err(e) => {
                warn!(error = %e, "Failed to load data file, trying backups");
                for backup in self.available_backups() {
                    if let Some(data) = self.load_from_backup(&backup.path) {
                        info!(backup = %backup.file_name, "Recovered from backup");
                        return migrate(data);
                    }
                }
                warn!("No usable backup found, starting empty");
                AppData::default()
            }
        }
    }

    /// Persist the aggregate. Returns false if the write did not happen.
    pub fn save(&self, data: &mut AppData) -> bool {
        match self.try_save(data) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Save failed");
                false
            }
        }
    }

    fn try_save(&self, data: &mut AppData) -> StorageResult<()> {
        data.schema_version = CURRENT_SCHEMA_VERSION;
        let json = serde_json::to_string_pretty(data)?;

        let temp_path = self.temp_path();
        fs::write(&temp_path, json)?;

        if let Err(e) = self.create_daily_backup() {
            warn!(error = %e, "Daily backup failed");
        }

        fs::rename(&temp_path, self.data_path())?;

        self.cleanup_old_backups();
        Ok(())
    }

    /// Snapshot the current `data.json` unless today already has a backup.
    fn create_daily_backup(&self) -> StorageResult<()> {
        let data_path = self.data_path();
        if !data_path.exists() {
            return Ok(());
        }

        let backup_path = self.backup_dir().join(backup_file_name(self.clock.today()));
        if backup_path.exists() {
            return Ok(());
        }

        fs::create_dir_all(self.backup_dir())?;
        fs::copy(&data_path, &backup_path)?;
        info!(path = %backup_path.display(), "Created daily backup");
        Ok(())
    }

    fn cleanup_old_backups(&self) {
        let Some(cutoff) = self
            .clock
            .today()
            .checked_sub_days(Days::new(BACKUP_RETENTION_DAYS))
        else {
            return;
        };

        for backup in self.available_backups() {
            if backup.date < cutoff {
                match fs::remove_file(&backup.path) {
                    Ok(()) => debug!(backup = %backup.file_name, "Removed old backup"),
                    Err(e) => warn!(backup = %backup.file_name, error = %e, "Failed to remove old backup"),
                }
            }
        }
    }

    // Backups

    /// Backup files, newest first.
    pub fn available_backups(&self) -> Vec<BackupInfo> {
        let entries = match fs::read_dir(self.backup_dir()) {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };

        let mut backups: Vec<BackupInfo> = entries
            .flatten()
            .filter_map(|entry| {
                let file_name = entry.file_name().to_string_lossy().into_owned();
                if !file_name.starts_with(BACKUP_PREFIX) || !file_name.ends_with(BACKUP_SUFFIX) {
                    return None;
                }
                let modified = entry.metadata().ok().and_then(|m| m.modified().ok());
                let date = backup_date(&file_name)
                    .or_else(|| modified.map(|t| DateTime::<Local>::from(t).date_naive()))?;
                Some(BackupInfo {
                    path: entry.path(),
                    file_name,
                    date,
                    modified,
                })
            })
            .collect();

        backups.sort_by(|a, b| b.date.cmp(&a.date).then(b.modified.cmp(&a.modified)));
        backups
    }

    pub fn load_from_backup(&self, path: &Path) -> Option<AppData> {
        match read_app_data(path) {
            Ok(data) => Some(data),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read backup");
                None
            }
        }
    }

    /// Remove every backup file. Used when resetting all data.
    pub fn delete_all_backups(&self) {
        for backup in self.available_backups() {
            if let Err(e) = fs::remove_file(&backup.path) {
                warn!(backup = %backup.file_name, error = %e, "Failed to delete backup");
            }
        }
    }

    // Import / export

    pub fn export(&self, data: &AppData) -> StorageResult<String> {
        Ok(serde_json::to_string_pretty(data)?)
    }

    /// Parse untrusted JSON. Returns `None` for blank, oversized, malformed,
    /// or task-heavy payloads.
    pub fn import(&self, text: &str) -> Option<AppData> {
        match validate_import(text) {
            Ok(data) => Some(migrate(data)),
            Err(e) => {
                warn!(error = %e, "Import rejected");
                None
            }
        }
    }

    pub fn export_to_file(&self, data: &AppData, path: &Path) -> bool {
        let result = self
            .export(data)
            .and_then(|json| fs::write(path, json).map_err(StorageError::from));
        match result {
            Ok(()) => true,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Export to file failed");
                false
            }
        }
    }

    /// Size is checked from metadata before the file is read.
    pub fn import_from_file(&self, path: &Path) -> Option<AppData> {
        let result = fs::metadata(path)
            .map_err(StorageError::from)
            .and_then(|meta| {
                let size = usize::try_from(meta.len()).unwrap_or(usize::MAX);
                if size > MAX_IMPORT_BYTES {
                    return Err(StorageError::TooLarge {
                        size,
                        limit: MAX_IMPORT_BYTES,
                    });
                }
                fs::read_to_string(path).map_err(StorageError::from)
            });
        match result {
            Ok(text) => self.import(&text),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Import from file failed");
                None
            }
        }
    }

    // UI settings

    pub fn load_ui_settings(&self) -> UiSettings {
        let path = self.ui_settings_path();
        if !path.exists() {
            return UiSettings::default();
        }

        fs::read_to_string(&path)
            .map_err(StorageError::from)
            .and_then(|s| serde_json::from_str(&s).map_err(StorageError::from))
            .unwrap_or_else(|e| {
                warn!(error = %e, "Failed to load UI settings");
                UiSettings::default()
            })
    }

    pub fn save_ui_settings(&self, settings: &UiSettings) -> bool {
        let result = serde_json::to_string_pretty(settings)
            .map_err(StorageError::from)
            .and_then(|json| fs::write(self.ui_settings_path(), json).map_err(StorageError::from));
        match result {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Failed to save UI settings");
                false
            }
        }
    }
}

impl Drop for Storage {
    fn drop(&mut self) {
        self.release_lock();
    }
}

fn read_app_data(path: &Path) -> StorageResult<AppData> {
    let json = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

fn validate_import(text: &str) -> StorageResult<AppData> {
    if text.trim().is_empty() {
        return Err(StorageError::Empty);
    }
    if text.len() > MAX_IMPORT_BYTES {
        return Err(StorageError::TooLarge {
            size: text.len(),
            limit: MAX_IMPORT_BYTES,
        });
    }

    let data: AppData = serde_json::from_str(text)?;
    if data.tasks.len() > MAX_IMPORT_TASKS {
        return Err(StorageError::TooManyTasks {
            count: data.tasks.len(),
            limit: MAX_IMPORT_TASKS,
        });
    }
    Ok(data)
}

/// Upgrade data written by an older schema to the current one.
fn migrate(mut data: AppData) -> AppData {
    let from = data.schema_version;
    if from < CURRENT_SCHEMA_VERSION {
        // Files missing the field default to the current version, so this only
        // sees an explicit older number. Version 0 has the same shape as 1.
        data.schema_version = CURRENT_SCHEMA_VERSION;
        info!(from, to = CURRENT_SCHEMA_VERSION, "Migrated data schema");
    }

    for task in &mut data.tasks {
        task.recurrence_interval = task.recurrence_interval.max(1);
    }
    data
}

fn backup_file_name(date: NaiveDate) -> String {
    format!("{BACKUP_PREFIX}{}{BACKUP_SUFFIX}", date.format("%Y-%m-%d"))
}

fn backup_date(file_name: &str) -> Option<NaiveDate> {
    let stem = file_name
        .strip_prefix(BACKUP_PREFIX)?
        .strip_suffix(BACKUP_SUFFIX)?;
    NaiveDate::parse_from_str(stem, "%Y-%m-%d").ok()
}
