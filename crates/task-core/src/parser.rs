//! Natural-language quick-add parser.
//!
//! Turns free text such as `"장보기 내일 #집안일"` or `"report fri +1w"` into a
//! cleaned title, an optional due date and the `#tag` names it mentions.
//! The parser is a pure function of its input and the supplied `today`.

use chrono::{Datelike, Days, Months, NaiveDate};
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Output of [`parse`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParseResult {
    pub title: String,
    pub due_date: Option<NaiveDate>,
    pub tags: Vec<String>,
}

type Resolver = fn(&Captures<'_>, NaiveDate) -> Option<NaiveDate>;

/// One family of date expressions, tried at the end of the title first and
/// then at the start.
struct DatePattern {
    suffix: Regex,
    prefix: Regex,
    resolve: Resolver,
}

impl DatePattern {
    fn new(suffix: &str, prefix: &str, resolve: Resolver) -> Self {
        Self {
            suffix: Regex::new(suffix).unwrap(),
            prefix: Regex::new(prefix).unwrap(),
            resolve,
        }
    }

    /// Byte range to cut and the date it stands for.
    fn find(&self, title: &str, today: NaiveDate) -> Option<(std::ops::Range<usize>, NaiveDate)> {
        [&self.suffix, &self.prefix].into_iter().find_map(|regex| {
            let caps = regex.captures(title)?;
            let date = (self.resolve)(&caps, today)?;
            caps.get(0).map(|m| (m.range(), date))
        })
    }
}

const KO_DAY: &str = "월|화|수|목|금|토|일";
const EN_DAY: &str = "monday|tuesday|wednesday|thursday|friday|saturday|sunday";

/// Date families in priority order; the first one that matches wins.
static DATE_PATTERNS: LazyLock<Vec<DatePattern>> = LazyLock::new(|| {
    vec![
        DatePattern::new(
            r"(?i)(?:\btoday|오늘)\s*$",
            r"(?i)^\s*(?:today|오늘)(?:\s+|$)",
            |_, today| Some(today),
        ),
        DatePattern::new(
            r"(?i)(?:\btomorrow|내일)\s*$",
            r"(?i)^\s*(?:tomorrow|내일)(?:\s+|$)",
            |_, today| today.checked_add_days(Days::new(1)),
        ),
        DatePattern::new(r"모레\s*$", r"^\s*모레(?:\s+|$)", |_, today| {
            today.checked_add_days(Days::new(2))
        }),
        DatePattern::new(r"글피\s*$", r"^\s*글피(?:\s+|$)", |_, today| {
            today.checked_add_days(Days::new(3))
        }),
        DatePattern::new(
            r"\+(\d+)([dwmDWM])\s*$",
            r"^\s*\+(\d+)([dwmDWM])(?:\s+|$)",
            resolve_relative,
        ),
        DatePattern::new(
            &format!(r"(?i)(?:다음\s*주\s*({KO_DAY})(?:요일)?|\bnext\s+({EN_DAY}))\s*$"),
            &format!(r"(?i)^\s*(?:다음\s*주\s*({KO_DAY})(?:요일)?|next\s+({EN_DAY}))(?:\s+|$)"),
            resolve_next_weekday,
        ),
        DatePattern::new(
            &format!(
                r"(?i)(?:^|\s)(?:이번\s*주\s*({KO_DAY})(?:요일)?|({KO_DAY})요일|(?:this\s+)?({EN_DAY}))\s*$"
            ),
            &format!(
                r"(?i)^\s*(?:이번\s*주\s*({KO_DAY})(?:요일)?|({KO_DAY})요일|(?:this\s+)?({EN_DAY}))(?:\s+|$)"
            ),
            resolve_weekday,
        ),
        DatePattern::new(
            r"(?i)(?:이번\s*주|\bthis\s+week)\s*$",
            r"(?i)^\s*(?:이번\s*주|this\s+week)(?:\s+|$)",
            |_, today| Some(end_of_week(today)),
        ),
        DatePattern::new(
            r"(?i)(?:다음\s*주|\bnext\s+week)\s*$",
            r"(?i)^\s*(?:다음\s*주|next\s+week)(?:\s+|$)",
            |_, today| today.checked_add_days(Days::new(7)).map(end_of_week),
        ),
        DatePattern::new(
            r"(?i)(?:이번\s*달|\bthis\s+month)\s*$",
            r"(?i)^\s*(?:이번\s*달|this\s+month)(?:\s+|$)",
            |_, today| end_of_month(today.year(), today.month()),
        ),
        DatePattern::new(
            r"(?i)(?:다음\s*달|\bnext\s+month)\s*$",
            r"(?i)^\s*(?:다음\s*달|next\s+month)(?:\s+|$)",
            |_, today| {
                let next = today.checked_add_months(Months::new(1))?;
                end_of_month(next.year(), next.month())
            },
        ),
        DatePattern::new(
            r"(?:^|\s)(\d{1,2})[/-](\d{1,2})\s*$",
            r"^\s*(\d{1,2})[/-](\d{1,2})(?:\s+|$)",
            resolve_month_day,
        ),
        DatePattern::new(
            r"(?:^|\s)(\d{1,2})월\s*(\d{1,2})일?\s*$",
            r"^\s*(\d{1,2})월\s*(\d{1,2})일?(?:\s+|$)",
            resolve_month_day,
        ),
    ]
});

/// `#name` or `#"name with spaces"`.
static TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"#("[^"]+"|[^\s#]+)\s*"#).unwrap());

/// Parse quick-add text relative to `today`.
pub fn parse(input: &str, today: NaiveDate) -> ParseResult {
    if input.trim().is_empty() {
        return ParseResult {
            title: input.to_string(),
            ..ParseResult::default()
        };
    }

    let mut title = input.trim().to_string();
    let mut due_date = None;

    for pattern in DATE_PATTERNS.iter() {
        if let Some((range, date)) = pattern.find(&title, today) {
            due_date = Some(date);
            title.replace_range(range, "");
            title = title.trim().to_string();
            break;
        }
    }

    let tags: Vec<String> = TAG_REGEX
        .captures_iter(&title)
        .filter_map(|cap| cap.get(1))
        .map(|m| m.as_str().trim_matches('"').trim().to_string())
        .filter(|name| !name.is_empty())
        .collect();
    if !tags.is_empty() {
        title = TAG_REGEX.replace_all(&title, "").trim().to_string();
    }

    if title.is_empty() {
        title = input.to_string();
    }

    ParseResult {
        title,
        due_date,
        tags,
    }
}

fn resolve_relative(caps: &Captures<'_>, today: NaiveDate) -> Option<NaiveDate> {
    let amount: u32 = caps.get(1)?.as_str().parse().ok()?;
    match caps.get(2)?.as_str().to_ascii_lowercase().as_str() {
        "d" => today.checked_add_days(Days::new(u64::from(amount))),
        "w" => today.checked_add_days(Days::new(u64::from(amount) * 7)),
        "m" => today.checked_add_months(Months::new(amount)),
        _ => None,
    }
}

/// Weekday named by whichever capture group matched, Monday = 1.
fn captured_weekday(caps: &Captures<'_>) -> Option<u32> {
    caps.iter()
        .skip(1)
        .flatten()
        .find_map(|m| weekday_number(m.as_str()))
}

fn weekday_number(token: &str) -> Option<u32> {
    match token.to_lowercase().as_str() {
        "월" | "monday" => Some(1),
        "화" | "tuesday" => Some(2),
        "수" | "wednesday" => Some(3),
        "목" | "thursday" => Some(4),
        "금" | "friday" => Some(5),
        "토" | "saturday" => Some(6),
        "일" | "sunday" => Some(7),
        _ => None,
    }
}

/// Next occurrence after today; today's own weekday resolves a week ahead.
fn resolve_weekday(caps: &Captures<'_>, today: NaiveDate) -> Option<NaiveDate> {
    let target = i64::from(captured_weekday(caps)?);
    let current = i64::from(today.weekday().number_from_monday());
    let mut days = target - current;
    if days <= 0 {
        days += 7;
    }
    today.checked_add_days(Days::new(days as u64))
}

/// The named weekday in the following Monday-based week.
fn resolve_next_weekday(caps: &Captures<'_>, today: NaiveDate) -> Option<NaiveDate> {
    let target = u64::from(captured_weekday(caps)?);
    let current = u64::from(today.weekday().number_from_monday());
    today.checked_add_days(Days::new(7 - current + target))
}

fn resolve_month_day(caps: &Captures<'_>, today: NaiveDate) -> Option<NaiveDate> {
    let month: u32 = caps.get(1)?.as_str().parse().ok()?;
    let day: u32 = caps.get(2)?.as_str().parse().ok()?;
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }

    let this_year = clamped_date(today.year(), month, day)?;
    if this_year < today {
        clamped_date(today.year() + 1, month, day)
    } else {
        Some(this_year)
    }
}

fn clamped_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    let last = end_of_month(year, month)?;
    NaiveDate::from_ymd_opt(year, month, day.min(last.day()))
}

/// Sunday closing the Monday-based week that contains `date`.
fn end_of_week(date: NaiveDate) -> NaiveDate {
    let offset = 7 - date.weekday().number_from_monday();
    date.checked_add_days(Days::new(u64::from(offset)))
        .unwrap_or(date)
}

fn end_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}
