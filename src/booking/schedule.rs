use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use super::clock::Clock;
use super::collaborators::CoachDirectory;
use super::error::{BookingError, BookingResult};
use crate::db::{Actor, ScheduleTemplate, UserRole, Weekday, WeeklyDays};

/// Persistence of weekly templates, one per coach.
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    async fn get(&self, coach_id: Uuid) -> BookingResult<Option<ScheduleTemplate>>;

    /// Overwrites the coach's template in place.
    async fn put(&self, template: ScheduleTemplate) -> BookingResult<ScheduleTemplate>;
}

/// Rejects windows that end before they start or overlap another window of
/// the same day. Touching windows (10:00-11:00, 11:00-12:00) are fine.
pub fn validate_days(days: &WeeklyDays) -> BookingResult<()> {
    for (weekday, day) in days {
        for window in &day.windows {
            if window.start_time >= window.end_time {
                return Err(BookingError::InvalidTemplate(format!(
                    "{} window {}-{} must start before it ends",
                    weekday,
                    hhmm(window.start_time),
                    hhmm(window.end_time)
                )));
            }
        }

        let mut sorted = day.windows.clone();
        sorted.sort_by_key(|w| w.start_time);
        if let Some(pair) = sorted.windows(2).find(|pair| pair[0].end_time > pair[1].start_time) {
            return Err(BookingError::InvalidTemplate(format!(
                "{} windows {}-{} and {}-{} overlap",
                weekday,
                hhmm(pair[0].start_time),
                hhmm(pair[0].end_time),
                hhmm(pair[1].start_time),
                hhmm(pair[1].end_time)
            )));
        }
    }
    Ok(())
}

/// Fills in missing weekdays as unavailable and orders each day's windows.
pub fn normalize_days(mut days: WeeklyDays) -> WeeklyDays {
    for weekday in Weekday::ALL {
        days.entry(weekday).or_default();
    }
    for day in days.values_mut() {
        day.windows.sort_by_key(|w| w.start_time);
    }
    days
}

fn hhmm(t: time::Time) -> String {
    format!("{:02}:{:02}", t.hour(), t.minute())
}

#[derive(Clone)]
pub struct ScheduleService {
    store: Arc<dyn ScheduleStore>,
    coaches: Arc<dyn CoachDirectory>,
    clock: Arc<dyn Clock>,
}

impl ScheduleService {
    pub fn new(
        store: Arc<dyn ScheduleStore>,
        coaches: Arc<dyn CoachDirectory>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            coaches,
            clock,
        }
    }

    /// A known coach who never saved a schedule gets the all-unavailable template.
    pub async fn get_template(&self, coach_id: Uuid) -> BookingResult<ScheduleTemplate> {
        if self.coaches.find_coach(coach_id).await?.is_none() {
            return Err(BookingError::coach_not_found(coach_id));
        }
        match self.store.get(coach_id).await? {
            Some(template) => Ok(template),
            None => Ok(ScheduleTemplate::empty(coach_id, self.clock.now())),
        }
    }

    pub async fn update_template(
        &self,
        actor: &Actor,
        coach_id: Uuid,
        days: WeeklyDays,
    ) -> BookingResult<ScheduleTemplate> {
        if actor.role != UserRole::Coach || actor.user_id != coach_id {
            return Err(BookingError::Unauthorized(format!(
                "user {} may not edit the schedule of coach {}",
                actor.user_id, coach_id
            )));
        }
        if self.coaches.find_coach(coach_id).await?.is_none() {
            return Err(BookingError::coach_not_found(coach_id));
        }

        validate_days(&days)?;
        let template = ScheduleTemplate {
            coach_id,
            days: normalize_days(days),
            updated_at: self.clock.now(),
        };
        let saved = self.store.put(template).await?;

        let offered = saved.days.values().filter(|d| d.available).count();
        tracing::info!(%coach_id, available_days = offered, "Schedule template updated");
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{DaySchedule, TimeWindow};
    use time::macros::time;

    fn day(windows: &[(time::Time, time::Time)]) -> DaySchedule {
        DaySchedule {
            available: true,
            windows: windows.iter().map(|(s, e)| TimeWindow::new(*s, *e)).collect(),
        }
    }

    #[test]
    fn accepts_touching_windows() {
        let mut days = WeeklyDays::new();
        days.insert(
            Weekday::Monday,
            day(&[(time!(10:00), time!(11:00)), (time!(09:00), time!(10:00))]),
        );
        assert!(validate_days(&days).is_ok());
    }

    #[test]
    fn rejects_inverted_and_empty_windows() {
        let mut days = WeeklyDays::new();
        days.insert(Weekday::Tuesday, day(&[(time!(10:00), time!(10:00))]));
        let err = validate_days(&days).unwrap_err();
        assert!(matches!(err, BookingError::InvalidTemplate(ref msg) if msg.contains("tuesday")));

        days.insert(Weekday::Tuesday, day(&[(time!(11:00), time!(10:00))]));
        assert!(matches!(validate_days(&days), Err(BookingError::InvalidTemplate(_))));
    }

    #[test]
    fn rejects_overlap_even_on_unavailable_days() {
        let mut days = WeeklyDays::new();
        let mut friday = day(&[(time!(09:00), time!(10:30)), (time!(10:00), time!(11:00))]);
        friday.available = false;
        days.insert(Weekday::Friday, friday);
        let err = validate_days(&days).unwrap_err();
        assert!(err.to_string().contains("overlap"));
    }

    #[test]
    fn normalize_fills_week_and_sorts() {
        let mut days = WeeklyDays::new();
        days.insert(
            Weekday::Sunday,
            day(&[(time!(14:00), time!(15:00)), (time!(09:00), time!(10:00))]),
        );
        let days = normalize_days(days);
        assert_eq!(days.len(), 7);
        assert!(!days[&Weekday::Monday].available);
        let starts: Vec<_> = days[&Weekday::Sunday].windows.iter().map(|w| w.start_time).collect();
        assert_eq!(starts, vec![time!(09:00), time!(14:00)]);
    }
}
