//! Projection of a weekly template onto concrete calendar days.
//!
//! Windows are emitted as configured; a 09:00-11:00 window is one block.

use time::{Date, Duration};

use super::error::BookingResult;
use super::schedule::validate_days;
use crate::db::{ScheduleTemplate, TimeWindow, Weekday};

/// Validated expansion of a template over `horizon_days` days from `from`.
/// Iterating it does not consume it, so it can be walked any number of times.
#[derive(Debug, Clone, Copy)]
pub struct SlotExpansion<'a> {
    template: &'a ScheduleTemplate,
    from: Date,
    horizon_days: u32,
}

pub fn expand(template: &ScheduleTemplate, horizon_days: u32, from: Date) -> BookingResult<SlotExpansion<'_>> {
    validate_days(&template.days)?;
    Ok(SlotExpansion {
        template,
        from,
        horizon_days,
    })
}

/// Offered windows of a single date, in start order.
pub fn windows_for_date(template: &ScheduleTemplate, date: Date) -> Vec<TimeWindow> {
    match template.day(Weekday::of(date)) {
        Some(day) if day.available => {
            let mut windows = day.windows.clone();
            windows.sort_by_key(|w| w.start_time);
            windows
        }
        _ => Vec::new(),
    }
}

impl<'a> SlotExpansion<'a> {
    pub fn iter(&self) -> ExpansionIter<'a> {
        ExpansionIter {
            template: self.template,
            from: self.from,
            horizon_days: self.horizon_days,
            next_offset: 0,
            current: None,
        }
    }
}

impl<'a> IntoIterator for &SlotExpansion<'a> {
    type Item = (Date, TimeWindow);
    type IntoIter = ExpansionIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Debug, Clone)]
pub struct ExpansionIter<'a> {
    template: &'a ScheduleTemplate,
    from: Date,
    horizon_days: u32,
    next_offset: u32,
    current: Option<(Date, std::vec::IntoIter<TimeWindow>)>,
}

impl Iterator for ExpansionIter<'_> {
    type Item = (Date, TimeWindow);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((date, windows)) = self.current.as_mut() {
                if let Some(window) = windows.next() {
                    return Some((*date, window));
                }
            }
            if self.next_offset >= self.horizon_days {
                return None;
            }
            // Running off the end of the calendar ends the sequence.
            let date = self
                .from
                .checked_add(Duration::days(i64::from(self.next_offset)))?;
            self.next_offset += 1;
            self.current = Some((date, windows_for_date(self.template, date).into_iter()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::BookingError;
    use crate::db::{DaySchedule, WeeklyDays};
    use time::macros::{date, datetime, time};
    use uuid::Uuid;

    fn template(days: &[(Weekday, &[(time::Time, time::Time)])]) -> ScheduleTemplate {
        let mut map = WeeklyDays::new();
        for (weekday, windows) in days {
            map.insert(
                *weekday,
                DaySchedule {
                    available: true,
                    windows: windows.iter().map(|(s, e)| TimeWindow::new(*s, *e)).collect(),
                },
            );
        }
        ScheduleTemplate {
            coach_id: Uuid::now_v7(),
            days: map,
            updated_at: datetime!(2025-03-01 00:00 UTC),
        }
    }

    #[test]
    fn yields_configured_windows_in_order_for_the_weekday() {
        let tpl = template(&[(
            Weekday::Monday,
            &[(time!(14:00), time!(15:00)), (time!(09:00), time!(10:00))],
        )]);
        // 2025-03-10 is a Monday.
        let expansion = expand(&tpl, 1, date!(2025-03-10)).unwrap();
        let got: Vec<_> = expansion.iter().collect();
        assert_eq!(
            got,
            vec![
                (date!(2025-03-10), TimeWindow::new(time!(09:00), time!(10:00))),
                (date!(2025-03-10), TimeWindow::new(time!(14:00), time!(15:00))),
            ]
        );
    }

    #[test]
    fn unavailable_and_missing_days_emit_nothing() {
        let mut tpl = template(&[(Weekday::Tuesday, &[(time!(09:00), time!(10:00))])]);
        tpl.days.get_mut(&Weekday::Tuesday).unwrap().available = false;
        let expansion = expand(&tpl, 7, date!(2025-03-10)).unwrap();
        assert_eq!(expansion.iter().count(), 0);
    }

    #[test]
    fn two_week_horizon_hits_each_weekday_twice() {
        let tpl = template(&[
            (Weekday::Monday, &[(time!(09:00), time!(10:00))]),
            (Weekday::Thursday, &[(time!(18:00), time!(19:30))]),
        ]);
        let expansion = expand(&tpl, 14, date!(2025-03-12)).unwrap();
        let dates: Vec<_> = expansion.iter().map(|(d, _)| d).collect();
        assert_eq!(
            dates,
            vec![
                date!(2025-03-13),
                date!(2025-03-17),
                date!(2025-03-20),
                date!(2025-03-24),
            ]
        );
    }

    #[test]
    fn expansion_is_restartable() {
        let tpl = template(&[(Weekday::Wednesday, &[(time!(08:00), time!(09:00))])]);
        let expansion = expand(&tpl, 21, date!(2025-03-01)).unwrap();
        let first: Vec<_> = expansion.iter().collect();
        let second: Vec<_> = (&expansion).into_iter().collect();
        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
    }

    #[test]
    fn zero_horizon_is_empty() {
        let tpl = template(&[(Weekday::Monday, &[(time!(09:00), time!(10:00))])]);
        assert_eq!(expand(&tpl, 0, date!(2025-03-10)).unwrap().iter().count(), 0);
    }

    #[test]
    fn inverted_window_is_rejected_before_iteration() {
        let tpl = template(&[(Weekday::Monday, &[(time!(10:00), time!(09:00))])]);
        assert!(matches!(
            expand(&tpl, 7, date!(2025-03-10)),
            Err(BookingError::InvalidTemplate(_))
        ));
    }
}
