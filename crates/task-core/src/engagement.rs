//! Pet reactions derived from engine state.

use crate::engine::{TaskEngine, ToggleOutcome};
use crate::models::PetStatus;
use chrono::NaiveDate;

/// Which greeting to show when the app opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Greeting {
    Daily,
    /// Yesterday's Today list was cleared.
    YesterdayPraise,
    /// Two or more days since the last open.
    WelcomeBack,
}

impl Greeting {
    pub fn message(&self) -> &'static str {
        match self {
            Greeting::Daily => "Take it slow today.",
            Greeting::YesterdayPraise => "Yesterday went well.",
            Greeting::WelcomeBack => "Long time no see.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mood {
    Normal,
    /// Nothing left for today.
    Resting,
    /// Something is overdue.
    Worried,
}

/// Reaction to a completion, most notable first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reaction {
    LevelUp { level: u32 },
    AllDone,
    FirstToday,
    Completed,
}

impl Reaction {
    pub fn message(&self) -> String {
        match self {
            Reaction::LevelUp { level } => format!("Lv.{level}. Congrats."),
            Reaction::AllDone => "That's it for today.".to_string(),
            Reaction::FirstToday => "First one done.".to_string(),
            Reaction::Completed => "One more off the list.".to_string(),
        }
    }
}

/// Pick the greeting for an app start on `today` and update the pet's
/// open-date bookkeeping. `None` if today's greeting was already shown.
///
/// Must run before the pet's daily counters are reset, since
/// `today_completed` still holds the previous day's count.
pub fn select_greeting(
    pet: &mut PetStatus,
    today: NaiveDate,
    today_list_empty: bool,
) -> Option<Greeting> {
    if pet.last_app_open_date == Some(today) && pet.has_shown_greeting_today {
        return None;
    }

    if pet.last_app_open_date != Some(today) {
        pet.yesterday_was_all_done = pet.today_completed > 0 && today_list_empty;
        pet.has_shown_greeting_today = false;
    }

    let days_away = pet.last_app_open_date.map(|last| (today - last).num_days());
    let greeting = match days_away {
        Some(days) if days >= 2 => Greeting::WelcomeBack,
        Some(days) if days >= 1 && pet.yesterday_was_all_done => Greeting::YesterdayPraise,
        _ => Greeting::Daily,
    };

    pet.last_app_open_date = Some(today);
    pet.has_shown_greeting_today = true;
    Some(greeting)
}

/// Greeting for app start, persisted through the engine.
pub fn greet(engine: &mut TaskEngine) -> Option<Greeting> {
    let today = engine.today();
    let today_list_empty = engine.today_task_count() == 0;
    let mut pet = engine.pet_status().clone();
    let greeting = select_greeting(&mut pet, today, today_list_empty)?;
    engine.update_pet_status(|status| *status = pet);
    Some(greeting)
}

pub fn current_mood(engine: &TaskEngine) -> Mood {
    if engine.today_task_count() == 0 {
        Mood::Resting
    } else if engine.has_overdue_tasks() {
        Mood::Worried
    } else {
        Mood::Normal
    }
}

/// `None` when the toggle reopened the task.
pub fn completion_reaction(outcome: &ToggleOutcome, pet: &PetStatus) -> Option<Reaction> {
    if !outcome.completed {
        return None;
    }
    let reaction = if outcome.leveled_up {
        Reaction::LevelUp { level: pet.level }
    } else if outcome.all_done {
        Reaction::AllDone
    } else if outcome.first_today {
        Reaction::FirstToday
    } else {
        Reaction::Completed
    };
    Some(reaction)
}
