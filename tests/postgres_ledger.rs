//! Ledger and template store against Postgres. Each test skips itself unless
//! `DATABASE_URL` points at a scratch database; every test registers its own
//! coach so runs never collide on a slot.

mod support;

use sqlx::PgPool;
use std::sync::Arc;
use time::macros::{datetime, time};
use uuid::Uuid;

use coach_booking::booking::{
    AppointmentLedger, BookingError, BookingService, CasOutcome, EventBus, FixedClock, LogNotifier,
    ScheduleService, ScheduleStore,
};
use coach_booking::config::{BookingConfig, DatabaseConfig};
use coach_booking::db::repositories::{AppointmentRepository, CoachRepository, ScheduleRepository};
use coach_booking::db::{init_pool, Actor, AppointmentStatus, BookingRequest, Weekday};
use support::days;

async fn pool() -> Option<PgPool> {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping Postgres test");
        return None;
    };
    let config = DatabaseConfig {
        url,
        max_connections: 20,
        min_connections: 1,
        acquire_timeout_secs: 10,
    };
    Some(init_pool(&config).await.expect("connect and migrate"))
}

async fn register_coach(pool: &PgPool) -> Uuid {
    let id = Uuid::now_v7();
    sqlx::query("INSERT INTO coaches (id, display_name, hourly_rate) VALUES ($1, $2, $3)")
        .bind(id)
        .bind("Postgres Coach")
        .bind(400.0_f64)
        .execute(pool)
        .await
        .expect("insert coach");
    id
}

fn booking_service(pool: &PgPool) -> BookingService {
    let config = BookingConfig::default();
    BookingService::new(
        Arc::new(AppointmentRepository::new(pool.clone())),
        Arc::new(CoachRepository::new(pool.clone())),
        Arc::new(LogNotifier),
        Arc::new(FixedClock::new(support::START)),
        EventBus::new(config.event_buffer),
        config,
    )
}

fn request(coach_id: Uuid) -> BookingRequest {
    BookingRequest {
        coach_id,
        datetime: datetime!(2025-03-11 09:00 +3),
        duration_minutes: None,
        notes: None,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn unique_index_admits_one_booking_per_slot_under_a_burst() {
    let Some(pool) = pool().await else { return };
    let coach_id = register_coach(&pool).await;
    let bookings = booking_service(&pool);

    let attempts: Vec<_> = (0..16)
        .map(|_| {
            let bookings = bookings.clone();
            tokio::spawn(async move {
                bookings
                    .book(&Actor::student(Uuid::now_v7()), request(coach_id))
                    .await
            })
        })
        .collect();

    let mut booked = 0;
    for attempt in attempts {
        match attempt.await.expect("task") {
            Ok(_) => booked += 1,
            Err(BookingError::SlotAlreadyTaken { .. }) => {}
            Err(err) => panic!("unexpected error: {err:?}"),
        }
    }
    assert_eq!(booked, 1);

    let ledger = AppointmentRepository::new(pool.clone());
    let active = ledger
        .active_for_coach_between(
            coach_id,
            datetime!(2025-03-11 00:00 +3),
            datetime!(2025-03-12 00:00 +3),
        )
        .await
        .unwrap();
    assert_eq!(active.len(), 1);
}

#[tokio::test]
async fn versioned_update_reports_the_newer_record() {
    let Some(pool) = pool().await else { return };
    let coach_id = register_coach(&pool).await;
    let appt = booking_service(&pool)
        .book(&Actor::student(Uuid::now_v7()), request(coach_id))
        .await
        .unwrap();
    let ledger = AppointmentRepository::new(pool.clone());

    let mut confirmed = appt.clone();
    confirmed.status = AppointmentStatus::Confirmed;
    let saved = match ledger.compare_and_swap(1, confirmed).await.unwrap() {
        CasOutcome::Applied(saved) => saved,
        other => panic!("expected the first write to apply: {other:?}"),
    };
    assert_eq!(saved.version, 2);
    assert_eq!(saved.status, AppointmentStatus::Confirmed);

    let mut cancelled = appt.clone();
    cancelled.status = AppointmentStatus::Cancelled;
    match ledger.compare_and_swap(1, cancelled).await.unwrap() {
        CasOutcome::Stale(current) => {
            assert_eq!(current.version, 2);
            assert_eq!(current.status, AppointmentStatus::Confirmed);
        }
        other => panic!("expected a stale outcome: {other:?}"),
    }

    let mut missing = appt;
    missing.id = Uuid::now_v7();
    let err = ledger.compare_and_swap(1, missing).await.unwrap_err();
    assert!(matches!(err, BookingError::NotFound(_)));
}

#[tokio::test]
async fn cancelled_slot_can_be_booked_again() {
    let Some(pool) = pool().await else { return };
    let coach_id = register_coach(&pool).await;
    let bookings = booking_service(&pool);
    let student = Actor::student(Uuid::now_v7());

    let first = bookings.book(&student, request(coach_id)).await.unwrap();
    bookings.cancel(&student, first.id, Some("clash".to_string())).await.unwrap();

    let second = bookings
        .book(&Actor::student(Uuid::now_v7()), request(coach_id))
        .await
        .unwrap();
    assert_ne!(first.id, second.id);

    let err = bookings
        .book(&Actor::student(Uuid::now_v7()), request(coach_id))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::SlotAlreadyTaken { .. }));

    let stored = bookings.get(&student, first.id).await.unwrap();
    assert_eq!(stored.status, AppointmentStatus::Cancelled);
    assert_eq!(stored.cancel_reason.as_deref(), Some("clash"));
}

#[tokio::test]
async fn template_days_round_trip_through_jsonb() {
    let Some(pool) = pool().await else { return };
    let coach_id = register_coach(&pool).await;
    let store = Arc::new(ScheduleRepository::new(pool.clone()));
    let schedules = ScheduleService::new(
        store.clone(),
        Arc::new(CoachRepository::new(pool.clone())),
        Arc::new(FixedClock::new(support::START)),
    );

    let saved = schedules
        .update_template(
            &Actor::coach(coach_id),
            coach_id,
            days(&[(
                Weekday::Monday,
                &[(time!(14:00), time!(15:00)), (time!(09:00), time!(10:00))],
            )]),
        )
        .await
        .unwrap();
    let loaded = store.get(coach_id).await.unwrap().expect("stored template");
    assert_eq!(loaded.days, saved.days);
    assert_eq!(loaded.updated_at, support::START);
    let starts: Vec<_> = loaded.days[&Weekday::Monday]
        .windows
        .iter()
        .map(|w| w.start_time)
        .collect();
    assert_eq!(starts, vec![time!(09:00), time!(14:00)]);

    let err = schedules.get_template(Uuid::now_v7()).await.unwrap_err();
    assert!(matches!(err, BookingError::NotFound(_)));
}
