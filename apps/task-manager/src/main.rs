//! Task Manager - single-user tasks, projects and tags from the terminal.
//!
//! Features:
//! - Quick-add with natural-language due dates and `#tags`
//! - Inbox, Today, Upcoming, Week and per-project/per-tag views
//! - Undo/redo, recurring tasks, reminders
//! - Crash-safe JSON storage with daily backups

mod app;
mod config;

use anyhow::{bail, Context, Result};
use app::{App, Control};
use config::Config;
use std::io::{self, BufRead, Write};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use task_core::{Clock, Storage, SystemClock, TaskEngine};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    let config = Config::load();
    if Config::config_path().is_some_and(|p| !p.exists()) {
        if let Err(e) = config.save() {
            eprintln!("could not write default config: {e}");
        }
    }
    init_logging(&config.logging.level);

    let data_dir = config
        .data_dir()
        .context("could not determine a data directory")?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let mut storage = Storage::open(&data_dir, clock.clone());

    if let Some(legacy) = &config.storage.legacy_data_dir {
        if storage.migrate_legacy_dir(legacy) {
            info!(from = %legacy.display(), "Migrated data from legacy directory");
        }
    }
    if storage.previous_session_unclean() {
        warn!("Previous session did not exit cleanly");
    }
    if !storage.acquire_lock() {
        bail!(
            "another task-manager instance is using {}",
            data_dir.display()
        );
    }

    let engine = TaskEngine::new(storage, clock);
    let mut app = App::new(engine, &config);
    app.start_session();
    print_messages(&mut app)?;

    let result = run_app(&mut app, Duration::from_secs(config.reminders.interval_secs.max(1)));
    info!("Exiting");
    result
}

fn print_messages(app: &mut App) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    for line in app.take_messages() {
        writeln!(stdout, "{line}")?;
    }
    stdout.flush()
}

fn prompt() -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    write!(stdout, "> ")?;
    stdout.flush()
}

/// Reads commands on a background thread so reminders can fire while the
/// prompt is idle.
fn run_app(app: &mut App, reminder_interval: Duration) -> Result<()> {
    let (tx, rx) = mpsc::channel::<String>();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    let mut last_scan = Instant::now();
    app.scan_reminders();
    print_messages(app)?;
    prompt()?;

    loop {
        let timeout = reminder_interval.saturating_sub(last_scan.elapsed());
        match rx.recv_timeout(timeout) {
            Ok(line) => {
                match app.execute(&line) {
                    Ok(Control::Quit) => return Ok(()),
                    Ok(Control::Continue) => {}
                    Err(e) => app_error(&e),
                }
                print_messages(app)?;
                prompt()?;
            }
            Err(RecvTimeoutError::Timeout) => {}
            // stdin closed
            Err(RecvTimeoutError::Disconnected) => return Ok(()),
        }

        if last_scan.elapsed() >= reminder_interval {
            last_scan = Instant::now();
            app.scan_reminders();
            let pending = app.take_messages();
            if !pending.is_empty() {
                println!();
                for line in pending {
                    println!("{line}");
                }
                prompt()?;
            }
        }
    }
}

fn app_error(e: &anyhow::Error) {
    eprintln!("error: {e:#}");
}
