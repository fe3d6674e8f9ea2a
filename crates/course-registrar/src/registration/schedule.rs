use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::Weekday;
use tracing::debug;

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Parsed meeting pattern: day tokens plus a half-open `[start, end)` window in
/// minutes after midnight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleSlot {
    days: BTreeSet<DayToken>,
    start: u32,
    end: u32,
}

/// One character of a day pattern. `MTWRFSU` map to weekdays; any other character is
/// kept as-is and only matches itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum DayToken {
    // Offset from Monday; `Weekday` has no ordering of its own.
    Weekday(u8),
    Other(char),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleParseError {
    #[error("schedule must contain a day pattern and a time range")]
    MissingFields,
    #[error("time range '{0}' must be two times separated by '-'")]
    MissingSeparator(String),
    #[error("invalid time '{0}', expected HH:MM")]
    InvalidTime(String),
}

impl ScheduleSlot {
    pub fn parse(descriptor: &str) -> Result<Self, ScheduleParseError> {
        let mut fields = descriptor.split_whitespace();
        let (days, range) = match (fields.next(), fields.next()) {
            (Some(days), Some(range)) => (days, range),
            _ => return Err(ScheduleParseError::MissingFields),
        };

        let days = days.chars().map(day_token).collect();

        let mut bounds = range.split('-');
        let (start, end) = match (bounds.next(), bounds.next(), bounds.next()) {
            (Some(start), Some(end), None) => (start, end),
            _ => return Err(ScheduleParseError::MissingSeparator(range.to_string())),
        };

        Ok(Self {
            days,
            start: minutes_of_day(start)?,
            end: minutes_of_day(end)?,
        })
    }

    pub fn weekdays(&self) -> impl Iterator<Item = Weekday> + '_ {
        self.days.iter().filter_map(|day| match day {
            DayToken::Weekday(offset) => Weekday::try_from(*offset).ok(),
            DayToken::Other(_) => None,
        })
    }

    /// Day characters outside `MTWRFSU`, uppercased.
    pub fn other_days(&self) -> impl Iterator<Item = char> + '_ {
        self.days.iter().filter_map(|day| match day {
            DayToken::Other(letter) => Some(*letter),
            DayToken::Weekday(_) => None,
        })
    }

    pub fn start_minute(&self) -> u32 {
        self.start
    }

    pub fn end_minute(&self) -> u32 {
        self.end
    }

    pub fn shares_day_with(&self, other: &ScheduleSlot) -> bool {
        !self.days.is_disjoint(&other.days)
    }

    pub fn overlaps(&self, other: &ScheduleSlot) -> bool {
        self.shares_day_with(other) && self.start < other.end && self.end > other.start
    }
}

impl FromStr for ScheduleSlot {
    type Err = ScheduleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Compare two raw descriptors. Anything that fails to parse never conflicts.
pub fn schedules_overlap(first: &str, second: &str) -> bool {
    match (ScheduleSlot::parse(first), ScheduleSlot::parse(second)) {
        (Ok(first), Ok(second)) => first.overlaps(&second),
        (Err(error), _) => {
            debug!(descriptor = first, %error, "ignoring malformed schedule");
            false
        }
        (_, Err(error)) => {
            debug!(descriptor = second, %error, "ignoring malformed schedule");
            false
        }
    }
}

fn day_token(letter: char) -> DayToken {
    let weekday = match letter.to_ascii_uppercase() {
        'M' => Weekday::Mon,
        'T' => Weekday::Tue,
        'W' => Weekday::Wed,
        'R' => Weekday::Thu,
        'F' => Weekday::Fri,
        'S' => Weekday::Sat,
        'U' => Weekday::Sun,
        other => return DayToken::Other(other),
    };
    DayToken::Weekday(weekday.num_days_from_monday() as u8)
}

/// `HH:MM` as minutes after midnight. `24:00` is accepted as the end of the day.
fn minutes_of_day(raw: &str) -> Result<u32, ScheduleParseError> {
    let invalid = || ScheduleParseError::InvalidTime(raw.to_string());
    let (hours, minutes) = raw.split_once(':').ok_or_else(invalid)?;
    let is_number = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    if !is_number(hours) || !is_number(minutes) {
        return Err(invalid());
    }

    let hours: u32 = hours.parse().map_err(|_| invalid())?;
    let minutes: u32 = minutes.parse().map_err(|_| invalid())?;
    let total = hours
        .checked_mul(60)
        .and_then(|value| value.checked_add(minutes))
        .ok_or_else(invalid)?;
    if minutes >= 60 || total > MINUTES_PER_DAY {
        return Err(invalid());
    }
    Ok(total)
}
