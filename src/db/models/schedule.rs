use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use std::collections::BTreeMap;
use std::fmt;
use time::{Date, OffsetDateTime, Time};

use super::formats::hh_mm;

/// Template day keys, ordered Monday first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    pub fn of(date: Date) -> Self {
        date.weekday().into()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Weekday::Monday => "monday",
            Weekday::Tuesday => "tuesday",
            Weekday::Wednesday => "wednesday",
            Weekday::Thursday => "thursday",
            Weekday::Friday => "friday",
            Weekday::Saturday => "saturday",
            Weekday::Sunday => "sunday",
        }
    }
}

impl From<time::Weekday> for Weekday {
    fn from(day: time::Weekday) -> Self {
        match day {
            time::Weekday::Monday => Weekday::Monday,
            time::Weekday::Tuesday => Weekday::Tuesday,
            time::Weekday::Wednesday => Weekday::Wednesday,
            time::Weekday::Thursday => Weekday::Thursday,
            time::Weekday::Friday => Weekday::Friday,
            time::Weekday::Saturday => Weekday::Saturday,
            time::Weekday::Sunday => Weekday::Sunday,
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A wall-clock window offered on a weekday, in the coach's local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    #[serde(with = "hh_mm")]
    pub start_time: Time,
    #[serde(with = "hh_mm")]
    pub end_time: Time,
}

impl TimeWindow {
    pub fn new(start_time: Time, end_time: Time) -> Self {
        Self { start_time, end_time }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySchedule {
    pub available: bool,
    #[serde(default)]
    pub windows: Vec<TimeWindow>,
}

pub type WeeklyDays = BTreeMap<Weekday, DaySchedule>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleTemplate {
    pub coach_id: Uuid,
    pub days: WeeklyDays,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl ScheduleTemplate {
    /// All seven days present, none available.
    pub fn empty(coach_id: Uuid, now: OffsetDateTime) -> Self {
        let days = Weekday::ALL
            .iter()
            .map(|day| (*day, DaySchedule::default()))
            .collect();
        Self {
            coach_id,
            days,
            updated_at: now,
        }
    }

    pub fn day(&self, weekday: Weekday) -> Option<&DaySchedule> {
        self.days.get(&weekday)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSchedulePayload {
    pub days: WeeklyDays,
}
