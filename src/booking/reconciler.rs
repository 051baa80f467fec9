//! Availability reconciliation: template windows merged with the ledger.
//!
//! A window counts as booked only when an active appointment starts exactly
//! at the window's start instant. Windows starting at or before the
//! reconciliation clock's "now" are dropped.

use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use time::{Date, Duration, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};
use uuid::Uuid;

use super::clock::Clock;
use super::error::{BookingError, BookingResult};
use super::expander::expand;
use super::ledger::AppointmentLedger;
use super::schedule::ScheduleService;
use crate::config::BookingConfig;
use crate::db::{hh_mm, iso_date, Appointment, TimeWindow, Weekday};

/// Derived on every read, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateSlot {
    #[serde(with = "iso_date")]
    pub date: Date,
    #[serde(with = "hh_mm")]
    pub start_time: Time,
    #[serde(with = "hh_mm")]
    pub end_time: Time,
    #[serde(with = "time::serde::rfc3339")]
    pub starts_at: OffsetDateTime,
    pub is_booked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DaySlots {
    #[serde(with = "iso_date")]
    pub date: Date,
    pub weekday: Weekday,
    pub slots: Vec<CandidateSlot>,
}

/// Absolute instant of a wall-clock time on `date` in the coach's offset.
pub fn local_instant(date: Date, at: Time, offset: UtcOffset) -> OffsetDateTime {
    PrimitiveDateTime::new(date, at).assume_offset(offset)
}

/// `[start of from, start of from + days)` in the coach's offset.
pub fn local_range(from: Date, days: u32, offset: UtcOffset) -> BookingResult<(OffsetDateTime, OffsetDateTime)> {
    let until = from
        .checked_add(Duration::days(i64::from(days)))
        .ok_or_else(|| BookingError::Validation(format!("date range from {} overflows the calendar", from)))?;
    Ok((
        local_instant(from, Time::MIDNIGHT, offset),
        local_instant(until, Time::MIDNIGHT, offset),
    ))
}

/// Marks booked windows and drops past ones; output sorted by start instant.
pub fn reconcile<I>(
    windows: I,
    booked: &[Appointment],
    now: OffsetDateTime,
    offset: UtcOffset,
) -> Vec<CandidateSlot>
where
    I: IntoIterator<Item = (Date, TimeWindow)>,
{
    let taken: HashSet<i128> = booked
        .iter()
        .filter(|a| a.status.is_active())
        .map(|a| a.datetime.unix_timestamp_nanos())
        .collect();

    let mut slots: Vec<CandidateSlot> = windows
        .into_iter()
        .filter_map(|(date, window)| {
            let starts_at = local_instant(date, window.start_time, offset);
            if starts_at <= now {
                return None;
            }
            Some(CandidateSlot {
                date,
                start_time: window.start_time,
                end_time: window.end_time,
                starts_at,
                is_booked: taken.contains(&starts_at.unix_timestamp_nanos()),
            })
        })
        .collect();
    slots.sort_by_key(|s| s.starts_at);
    slots
}

#[derive(Clone)]
pub struct AvailabilityReconciler {
    schedules: ScheduleService,
    ledger: Arc<dyn AppointmentLedger>,
    clock: Arc<dyn Clock>,
    config: BookingConfig,
}

impl AvailabilityReconciler {
    pub fn new(
        schedules: ScheduleService,
        ledger: Arc<dyn AppointmentLedger>,
        clock: Arc<dyn Clock>,
        config: BookingConfig,
    ) -> Self {
        Self {
            schedules,
            ledger,
            clock,
            config,
        }
    }

    /// Bookable slots only.
    pub async fn available_slots(&self, coach_id: Uuid, date: Date) -> BookingResult<Vec<CandidateSlot>> {
        let mut slots = self.slot_board(coach_id, date).await?;
        slots.retain(|s| !s.is_booked);
        Ok(slots)
    }

    /// Every upcoming window of the day with its booked flag, for calendar views.
    pub async fn slot_board(&self, coach_id: Uuid, date: Date) -> BookingResult<Vec<CandidateSlot>> {
        let template = self.schedules.get_template(coach_id).await?;
        let expansion = expand(&template, 1, date)?;

        let (from, until) = local_range(date, 1, self.config.utc_offset)?;
        let booked = self
            .ledger
            .active_for_coach_between(coach_id, from, until)
            .await?;

        let slots = reconcile(&expansion, &booked, self.clock.now(), self.config.utc_offset);
        tracing::debug!(
            %coach_id,
            %date,
            windows = slots.len(),
            booked = slots.iter().filter(|s| s.is_booked).count(),
            "Reconciled availability"
        );
        Ok(slots)
    }

    /// Bookable slots for `days` consecutive days starting at `from`
    /// (defaults: today in the coach's offset, the configured horizon).
    pub async fn calendar(
        &self,
        coach_id: Uuid,
        from: Option<Date>,
        days: Option<u32>,
    ) -> BookingResult<Vec<DaySlots>> {
        let offset = self.config.utc_offset;
        let now = self.clock.now();
        let from = from.unwrap_or_else(|| now.to_offset(offset).date());
        let days = days.unwrap_or(self.config.horizon_days);
        if days == 0 || days > self.config.horizon_days {
            return Err(BookingError::Validation(format!(
                "days must be between 1 and {}",
                self.config.horizon_days
            )));
        }

        let template = self.schedules.get_template(coach_id).await?;
        let expansion = expand(&template, days, from)?;
        let (range_start, range_end) = local_range(from, days, offset)?;
        let booked = self
            .ledger
            .active_for_coach_between(coach_id, range_start, range_end)
            .await?;

        let slots = reconcile(&expansion, &booked, now, offset);
        let mut calendar: Vec<DaySlots> = (0..days)
            .filter_map(|i| from.checked_add(Duration::days(i64::from(i))))
            .map(|date| DaySlots {
                date,
                weekday: Weekday::of(date),
                slots: Vec::new(),
            })
            .collect();
        for slot in slots.into_iter().filter(|s| !s.is_booked) {
            if let Some(day) = calendar.iter_mut().find(|d| d.date == slot.date) {
                day.slots.push(slot);
            }
        }
        Ok(calendar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::AppointmentStatus;
    use time::macros::{date, datetime, offset, time};

    fn booked_at(at: OffsetDateTime, status: AppointmentStatus) -> Appointment {
        Appointment {
            id: Uuid::now_v7(),
            coach_id: Uuid::now_v7(),
            student_id: Uuid::now_v7(),
            datetime: at,
            duration_minutes: 60,
            status,
            notes: String::new(),
            cancel_reason: None,
            cancelled_by: None,
            cancelled_at: None,
            hidden_from: Vec::new(),
            version: 1,
            created_at: at,
            updated_at: at,
        }
    }

    fn window(start: Time, end: Time) -> TimeWindow {
        TimeWindow::new(start, end)
    }

    #[test]
    fn started_window_is_dropped_and_later_one_kept() {
        let day = date!(2025-03-10);
        let now = datetime!(2025-03-10 14:30 +3);
        let slots = reconcile(
            vec![
                (day, window(time!(14:00), time!(15:00))),
                (day, window(time!(15:00), time!(16:00))),
            ],
            &[],
            now,
            offset!(+3),
        );
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].start_time, time!(15:00));
        assert!(!slots[0].is_booked);
    }

    #[test]
    fn window_starting_exactly_now_is_past() {
        let day = date!(2025-03-10);
        let slots = reconcile(
            vec![(day, window(time!(09:00), time!(10:00)))],
            &[],
            datetime!(2025-03-10 06:00 UTC),
            offset!(+3),
        );
        assert!(slots.is_empty());
    }

    #[test]
    fn exact_start_match_marks_booked() {
        let day = date!(2025-03-11);
        let now = datetime!(2025-03-10 12:00 UTC);
        let booked = vec![
            // 10:00 +03:00 expressed in UTC.
            booked_at(datetime!(2025-03-11 07:00 UTC), AppointmentStatus::Confirmed),
            // Inside the 11:00 window but not at its start: not a match.
            booked_at(datetime!(2025-03-11 11:30 +3), AppointmentStatus::Pending),
            booked_at(datetime!(2025-03-11 13:00 +3), AppointmentStatus::Cancelled),
        ];
        let slots = reconcile(
            vec![
                (day, window(time!(13:00), time!(14:00))),
                (day, window(time!(10:00), time!(11:00))),
                (day, window(time!(11:00), time!(12:00))),
            ],
            &booked,
            now,
            offset!(+3),
        );
        let flags: Vec<_> = slots.iter().map(|s| (s.start_time, s.is_booked)).collect();
        assert_eq!(
            flags,
            vec![
                (time!(10:00), true),
                (time!(11:00), false),
                (time!(13:00), false),
            ]
        );
    }

    #[test]
    fn local_range_covers_the_coach_day() {
        let (from, until) = local_range(date!(2025-03-10), 1, offset!(+3)).unwrap();
        assert_eq!(from, datetime!(2025-03-09 21:00 UTC));
        assert_eq!(until, datetime!(2025-03-10 21:00 UTC));
    }
}
