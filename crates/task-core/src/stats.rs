//! Daily statistics, streaks, and the chart data derived from them.

use crate::models::{DailyStats, Statistics};
use chrono::{Days, NaiveDate};

/// Days of history kept in [`Statistics::daily_history`].
pub const HISTORY_DAYS: u64 = 30;

impl Statistics {
    /// Add `completed`/`created` to today's counters, advance the streak on
    /// completions, and drop history older than the retention window.
    pub fn record(&mut self, today: NaiveDate, completed: u32, created: u32) {
        match self.daily_history.iter_mut().find(|s| s.date == today) {
            Some(entry) => {
                entry.completed += completed;
                entry.created += created;
            }
            None => self.daily_history.push(DailyStats {
                date: today,
                completed,
                created,
            }),
        }

        if completed > 0 {
            self.advance_streak(today);
        }

        self.prune(today);
    }

    fn advance_streak(&mut self, today: NaiveDate) {
        let yesterday = today.pred_opt();
        match self.last_completion_date {
            Some(last) if last == today => {}
            Some(last) if Some(last) == yesterday => self.current_streak += 1,
            _ => self.current_streak = 1,
        }
        self.last_completion_date = Some(today);
        self.best_streak = self.best_streak.max(self.current_streak);
    }

    fn prune(&mut self, today: NaiveDate) {
        if let Some(cutoff) = today.checked_sub_days(Days::new(HISTORY_DAYS)) {
            self.daily_history.retain(|s| s.date >= cutoff);
        }
    }

    /// Completions recorded on `date`.
    pub fn completed_on(&self, date: NaiveDate) -> u32 {
        self.daily_history
            .iter()
            .find(|s| s.date == date)
            .map_or(0, |s| s.completed)
    }

    /// The last seven days, oldest first.
    pub fn weekly_completions(&self, today: NaiveDate) -> Vec<(NaiveDate, u32)> {
        trailing_days(today, 7)
            .map(|date| (date, self.completed_on(date)))
            .collect()
    }

    /// The last thirty days as heatmap cells, oldest first.
    pub fn monthly_heatmap(&self, today: NaiveDate) -> Vec<HeatmapCell> {
        trailing_days(today, HISTORY_DAYS)
            .map(|date| {
                let completed = self.completed_on(date);
                HeatmapCell {
                    date,
                    completed,
                    intensity: intensity(completed),
                }
            })
            .collect()
    }
}

fn trailing_days(today: NaiveDate, count: u64) -> impl Iterator<Item = NaiveDate> {
    (0..count)
        .rev()
        .filter_map(move |back| today.checked_sub_days(Days::new(back)))
}

/// One day of the completion heatmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeatmapCell {
    pub date: NaiveDate,
    pub completed: u32,
    /// Colour bucket, 0 (none) to 4 (five or more).
    pub intensity: u8,
}

fn intensity(completed: u32) -> u8 {
    match completed {
        0 => 0,
        1 => 1,
        2 => 2,
        3 | 4 => 3,
        _ => 4,
    }
}
