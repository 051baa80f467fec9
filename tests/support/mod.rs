#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use time::macros::datetime;
use time::{OffsetDateTime, Time};
use tokio::sync::Mutex;
use uuid::Uuid;

use coach_booking::booking::{
    AvailabilityReconciler, BookingNotifier, BookingService, EventBus, FixedClock,
    InMemoryCoachDirectory, InMemoryLedger, InMemoryScheduleStore, ScheduleService,
};
use coach_booking::config::BookingConfig;
use coach_booking::db::{
    Actor, Appointment, BookingRequest, CoachProfile, DaySchedule, TimeWindow, UserRole, Weekday,
    WeeklyDays,
};

/// Monday 2025-03-10, 08:00 in the default +03:00 coach offset.
pub const START: OffsetDateTime = datetime!(2025-03-10 08:00 +3);

/// Records confirmation notifications; can be switched to fail or to never answer.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    pub calls: Mutex<Vec<(Uuid, Uuid, Uuid)>>,
    pub fail: AtomicBool,
    pub stall: AtomicBool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        let notifier = Self::default();
        notifier.fail.store(true, Ordering::SeqCst);
        notifier
    }

    pub fn stalled() -> Self {
        let notifier = Self::default();
        notifier.stall.store(true, Ordering::SeqCst);
        notifier
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }

    /// Notifications run detached from the confirming call.
    pub async fn wait_for_calls(&self, expected: usize) {
        let waited = tokio::time::timeout(Duration::from_secs(5), async {
            while self.call_count().await < expected {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await;
        assert!(waited.is_ok(), "expected {expected} notification(s)");
    }
}

#[async_trait]
impl BookingNotifier for RecordingNotifier {
    async fn notify_booking_confirmed(
        &self,
        coach_id: Uuid,
        student_id: Uuid,
        appointment_id: Uuid,
    ) -> anyhow::Result<()> {
        self.calls
            .lock()
            .await
            .push((coach_id, student_id, appointment_id));
        if self.stall.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("messaging service unavailable");
        }
        Ok(())
    }
}

pub struct Harness {
    pub clock: Arc<FixedClock>,
    pub ledger: Arc<InMemoryLedger>,
    pub coaches: Arc<InMemoryCoachDirectory>,
    pub notifier: Arc<RecordingNotifier>,
    pub schedules: ScheduleService,
    pub availability: AvailabilityReconciler,
    pub bookings: BookingService,
    pub coach: Actor,
    pub student: Actor,
    pub other_student: Actor,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_notifier(RecordingNotifier::default()).await
    }

    pub async fn with_notifier(notifier: RecordingNotifier) -> Self {
        let clock = Arc::new(FixedClock::new(START));
        let ledger = Arc::new(InMemoryLedger::new());
        let coaches = Arc::new(InMemoryCoachDirectory::new());
        let notifier = Arc::new(notifier);
        let config = BookingConfig::default();

        let coach = Actor::coach(Uuid::now_v7());
        coaches.insert(coach_profile(coach.user_id)).await;

        let schedules = ScheduleService::new(
            Arc::new(InMemoryScheduleStore::new()),
            coaches.clone(),
            clock.clone(),
        );
        let availability = AvailabilityReconciler::new(
            schedules.clone(),
            ledger.clone(),
            clock.clone(),
            config.clone(),
        );
        let bookings = BookingService::new(
            ledger.clone(),
            coaches.clone(),
            notifier.clone(),
            clock.clone(),
            EventBus::new(config.event_buffer),
            config,
        );

        Self {
            clock,
            ledger,
            coaches,
            notifier,
            schedules,
            availability,
            bookings,
            coach,
            student: Actor::student(Uuid::now_v7()),
            other_student: Actor::student(Uuid::now_v7()),
        }
    }

    pub async fn set_template(&self, days: WeeklyDays) {
        self.schedules
            .update_template(&self.coach, self.coach.user_id, days)
            .await
            .expect("template update");
    }

    pub fn request(&self, at: OffsetDateTime) -> BookingRequest {
        BookingRequest {
            coach_id: self.coach.user_id,
            datetime: at,
            duration_minutes: None,
            notes: None,
        }
    }

    pub async fn book_as(&self, actor: &Actor, at: OffsetDateTime) -> Appointment {
        self.bookings
            .book(actor, self.request(at))
            .await
            .expect("booking")
    }
}

pub fn coach_profile(id: Uuid) -> CoachProfile {
    CoachProfile {
        id,
        display_name: "Test Coach".to_string(),
        hourly_rate: 450.0,
        is_active: true,
    }
}

pub fn admin() -> Actor {
    Actor::new(Uuid::now_v7(), UserRole::Admin)
}

pub fn days(entries: &[(Weekday, &[(Time, Time)])]) -> WeeklyDays {
    let mut days = BTreeMap::new();
    for (weekday, windows) in entries {
        days.insert(
            *weekday,
            DaySchedule {
                available: true,
                windows: windows.iter().map(|(s, e)| TimeWindow::new(*s, *e)).collect(),
            },
        );
    }
    days
}
