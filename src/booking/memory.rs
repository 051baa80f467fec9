//! In-process storage backend, used without `DATABASE_URL` and in tests.

use async_trait::async_trait;
use std::collections::HashMap;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::collaborators::CoachDirectory;
use super::error::{BookingError, BookingResult};
use super::ledger::{AppointmentLedger, CasOutcome};
use super::schedule::ScheduleStore;
use crate::db::{Appointment, CoachProfile, ScheduleTemplate};

type SlotKey = (Uuid, i128);

fn slot_key(coach_id: Uuid, datetime: OffsetDateTime) -> SlotKey {
    (coach_id, datetime.unix_timestamp_nanos())
}

#[derive(Debug, Default)]
struct LedgerState {
    appointments: HashMap<Uuid, Appointment>,
    // (coach, start instant) -> id of the pending/confirmed appointment holding it
    active_slots: HashMap<SlotKey, Uuid>,
}

/// Appointment ledger guarded by one lock, so the slot check and the insert
/// (or the version check and the write) happen under the same write guard.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: RwLock<LedgerState>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.appointments.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Active appointments for one coach and start instant; at most one by construction.
    pub async fn active_at(&self, coach_id: Uuid, datetime: OffsetDateTime) -> Vec<Appointment> {
        let state = self.state.read().await;
        state
            .appointments
            .values()
            .filter(|a| a.coach_id == coach_id && a.datetime == datetime && a.status.is_active())
            .cloned()
            .collect()
    }
}

fn newest_first(mut appointments: Vec<Appointment>) -> Vec<Appointment> {
    appointments.sort_by(|a, b| b.datetime.cmp(&a.datetime).then(b.created_at.cmp(&a.created_at)));
    appointments
}

#[async_trait]
impl AppointmentLedger for InMemoryLedger {
    async fn insert_if_slot_free(&self, appointment: Appointment) -> BookingResult<Appointment> {
        let mut state = self.state.write().await;
        let key = slot_key(appointment.coach_id, appointment.datetime);

        if appointment.status.is_active() {
            if state.active_slots.contains_key(&key) {
                return Err(BookingError::SlotAlreadyTaken {
                    coach_id: appointment.coach_id,
                    datetime: appointment.datetime,
                });
            }
            state.active_slots.insert(key, appointment.id);
        }
        state.appointments.insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    async fn get(&self, id: Uuid) -> BookingResult<Option<Appointment>> {
        Ok(self.state.read().await.appointments.get(&id).cloned())
    }

    async fn compare_and_swap(
        &self,
        expected_version: i64,
        mut updated: Appointment,
    ) -> BookingResult<CasOutcome> {
        let mut state = self.state.write().await;
        let current = state
            .appointments
            .get(&updated.id)
            .cloned()
            .ok_or_else(|| BookingError::appointment_not_found(updated.id))?;

        if current.version != expected_version {
            return Ok(CasOutcome::Stale(current));
        }

        let key = slot_key(current.coach_id, current.datetime);
        if current.status.is_active() && !updated.status.is_active() {
            if state.active_slots.get(&key) == Some(&current.id) {
                state.active_slots.remove(&key);
            }
        } else if !current.status.is_active() && updated.status.is_active() {
            // Re-activation would bypass the slot check; the state machine never does it.
            if state.active_slots.contains_key(&key) {
                return Err(BookingError::SlotAlreadyTaken {
                    coach_id: current.coach_id,
                    datetime: current.datetime,
                });
            }
            state.active_slots.insert(key, current.id);
        }

        updated.version = expected_version + 1;
        state.appointments.insert(updated.id, updated.clone());
        Ok(CasOutcome::Applied(updated))
    }

    async fn active_for_coach_between(
        &self,
        coach_id: Uuid,
        from: OffsetDateTime,
        until: OffsetDateTime,
    ) -> BookingResult<Vec<Appointment>> {
        let state = self.state.read().await;
        let mut found: Vec<Appointment> = state
            .appointments
            .values()
            .filter(|a| {
                a.coach_id == coach_id
                    && a.status.is_active()
                    && a.datetime >= from
                    && a.datetime < until
            })
            .cloned()
            .collect();
        found.sort_by_key(|a| a.datetime);
        Ok(found)
    }

    async fn list_for_coach(&self, coach_id: Uuid) -> BookingResult<Vec<Appointment>> {
        let state = self.state.read().await;
        Ok(newest_first(
            state
                .appointments
                .values()
                .filter(|a| a.coach_id == coach_id)
                .cloned()
                .collect(),
        ))
    }

    async fn list_for_student(&self, student_id: Uuid) -> BookingResult<Vec<Appointment>> {
        let state = self.state.read().await;
        Ok(newest_first(
            state
                .appointments
                .values()
                .filter(|a| a.student_id == student_id)
                .cloned()
                .collect(),
        ))
    }
}

#[derive(Debug, Default)]
pub struct InMemoryScheduleStore {
    templates: RwLock<HashMap<Uuid, ScheduleTemplate>>,
}

impl InMemoryScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ScheduleStore for InMemoryScheduleStore {
    async fn get(&self, coach_id: Uuid) -> BookingResult<Option<ScheduleTemplate>> {
        Ok(self.templates.read().await.get(&coach_id).cloned())
    }

    async fn put(&self, template: ScheduleTemplate) -> BookingResult<ScheduleTemplate> {
        self.templates
            .write()
            .await
            .insert(template.coach_id, template.clone());
        Ok(template)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryCoachDirectory {
    coaches: RwLock<HashMap<Uuid, CoachProfile>>,
}

impl InMemoryCoachDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, profile: CoachProfile) {
        self.coaches.write().await.insert(profile.id, profile);
    }
}

#[async_trait]
impl CoachDirectory for InMemoryCoachDirectory {
    async fn find_coach(&self, coach_id: Uuid) -> BookingResult<Option<CoachProfile>> {
        Ok(self
            .coaches
            .read()
            .await
            .get(&coach_id)
            .filter(|c| c.is_active)
            .cloned())
    }
}
