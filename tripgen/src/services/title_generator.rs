//! Title Generator
//!
//! Classifies a visit as a day out, weekend, week or holiday and renders
//! the matching story titles.

use crate::models::Visit;
use chrono::{Datelike, Duration, Weekday};

/// Kind of trip, decided by visit duration and weekday span
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripKind {
    Day,
    Weekend,
    Week,
    Holiday,
}

impl TripKind {
    /// Classify a visit.
    ///
    /// - under 24 hours: day
    /// - over 24 and up to 96 hours: weekend when it starts Friday or
    ///   Saturday and ends Sunday or Monday, otherwise week
    /// - anything else (over 96 hours, or exactly 24): holiday
    pub fn classify(visit: &Visit) -> Self {
        let duration = visit.duration();
        let one_day = Duration::hours(24);
        let four_days = Duration::hours(96);

        if duration < one_day {
            TripKind::Day
        } else if duration > one_day && duration <= four_days {
            if starts_weekend(visit.start().weekday()) && ends_weekend(visit.end().weekday()) {
                TripKind::Weekend
            } else {
                TripKind::Week
            }
        } else {
            TripKind::Holiday
        }
    }

    /// Phrases specific to this kind, in output order
    pub fn phrases(self) -> &'static [Phrase] {
        match self {
            TripKind::Day => DAY_PHRASES,
            TripKind::Weekend => WEEKEND_PHRASES,
            TripKind::Week => WEEK_PHRASES,
            TripKind::Holiday => HOLIDAY_PHRASES,
        }
    }
}

/// Friday or Saturday, in a week that starts on Sunday
fn starts_weekend(day: Weekday) -> bool {
    day.num_days_from_sunday() >= Weekday::Fri.num_days_from_sunday()
}

/// Sunday or Monday
fn ends_weekend(day: Weekday) -> bool {
    day.num_days_from_sunday() <= Weekday::Mon.num_days_from_sunday()
}

/// Title template. Each variant is a pure function of a visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phrase {
    /// `"{prefix} {place}"`
    Location(&'static str),
    /// `"{place} {word} {month}"`
    Delimiter(&'static str),
    /// `"{phrase} {place} {delimiter} {month}"`
    Combination {
        phrase: &'static str,
        delimiter: &'static str,
    },
}

impl Phrase {
    pub fn render(&self, visit: &Visit) -> String {
        match *self {
            Phrase::Location(prefix) => format!("{} {}", prefix, visit.place()),
            Phrase::Delimiter(word) => format!("{} {} {}", visit.place(), word, month_name(visit)),
            Phrase::Combination { phrase, delimiter } => format!(
                "{} {} {} {}",
                phrase,
                visit.place(),
                delimiter,
                month_name(visit)
            ),
        }
    }
}

/// Full English month name of the visit start, e.g. "March"
fn month_name(visit: &Visit) -> String {
    visit.start().format("%B").to_string()
}

const DAY_PHRASES: &[Phrase] = &[
    Phrase::Location("A day out in"),
    Phrase::Location("A trip to"),
];

const WEEKEND_PHRASES: &[Phrase] = &[
    Phrase::Location("A weekend getaway to"),
    Phrase::Location("A weekend in"),
];

const WEEK_PHRASES: &[Phrase] = &[Phrase::Location("A trip away to")];

const HOLIDAY_PHRASES: &[Phrase] = &[Phrase::Location("Holiday to")];

/// Appended to every kind
const ANY_PHRASES: &[Phrase] = &[
    Phrase::Delimiter("in"),
    Phrase::Combination {
        phrase: "Visiting",
        delimiter: "in",
    },
];

/// Generate story titles for a visit.
///
/// Kind-specific phrases come first, then the phrases shared by every kind.
pub fn generate_titles(visit: &Visit) -> Vec<String> {
    TripKind::classify(visit)
        .phrases()
        .iter()
        .chain(ANY_PHRASES)
        .map(|phrase| phrase.render(visit))
        .collect()
}
