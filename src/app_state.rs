use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;

use crate::booking::{
    AppointmentLedger, AvailabilityReconciler, BookingNotifier, BookingService, Clock,
    CoachDirectory, EventBus, InMemoryCoachDirectory, InMemoryLedger, InMemoryScheduleStore,
    ScheduleService, ScheduleStore,
};
use crate::config::Config;
use crate::db::repositories::{AppointmentRepository, CoachRepository, ScheduleRepository};
use crate::i18n::Localizer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    InMemory,
    Postgres,
}

/// The storage backends the services run on.
#[derive(Clone)]
pub struct Storage {
    pub kind: StorageKind,
    pub ledger: Arc<dyn AppointmentLedger>,
    pub schedules: Arc<dyn ScheduleStore>,
    pub coaches: Arc<dyn CoachDirectory>,
    pub pool: Option<PgPool>,
}

impl Storage {
    pub fn in_memory(coaches: Arc<InMemoryCoachDirectory>) -> Self {
        Self {
            kind: StorageKind::InMemory,
            ledger: Arc::new(InMemoryLedger::new()),
            schedules: Arc::new(InMemoryScheduleStore::new()),
            coaches,
            pool: None,
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self {
            kind: StorageKind::Postgres,
            ledger: Arc::new(AppointmentRepository::new(pool.clone())),
            schedules: Arc::new(ScheduleRepository::new(pool.clone())),
            coaches: Arc::new(CoachRepository::new(pool.clone())),
            pool: Some(pool),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub bookings: BookingService,
    pub schedules: ScheduleService,
    pub availability: AvailabilityReconciler,
    pub env: Config,
    pub localizer: Arc<Localizer>,
    pub storage: StorageKind,
    pub db: Option<PgPool>,
}

impl AppState {
    pub fn new(
        env: Config,
        storage: Storage,
        notifier: Arc<dyn BookingNotifier>,
        clock: Arc<dyn Clock>,
        localizer: Arc<Localizer>,
    ) -> Self {
        let booking = env.booking.clone();
        let events = EventBus::new(booking.event_buffer);

        let schedules = ScheduleService::new(storage.schedules, storage.coaches.clone(), clock.clone());
        let availability = AvailabilityReconciler::new(
            schedules.clone(),
            storage.ledger.clone(),
            clock.clone(),
            booking.clone(),
        );
        let bookings = BookingService::new(
            storage.ledger,
            storage.coaches,
            notifier,
            clock,
            events,
            booking,
        );

        Self {
            bookings,
            schedules,
            availability,
            env,
            localizer,
            storage: storage.kind,
            db: storage.pool,
        }
    }
}
