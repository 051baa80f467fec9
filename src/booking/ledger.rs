use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use super::error::BookingResult;
use crate::db::Appointment;

/// Result of a versioned write.
#[derive(Debug, Clone, PartialEq)]
pub enum CasOutcome {
    /// Written; carries the stored record with its new version.
    Applied(Appointment),
    /// Someone else wrote first; carries the record as it is now.
    Stale(Appointment),
}

/// Authoritative appointment store.
///
/// Implementations must make `insert_if_slot_free` a single indivisible
/// check-and-insert with respect to every other insert for the same coach and
/// start instant, and must apply `compare_and_swap` only when the stored
/// version still equals `expected_version`.
#[async_trait]
pub trait AppointmentLedger: Send + Sync {
    /// Fails with `SlotAlreadyTaken` when the coach already holds a pending or
    /// confirmed appointment starting at the same instant.
    async fn insert_if_slot_free(&self, appointment: Appointment) -> BookingResult<Appointment>;

    async fn get(&self, id: Uuid) -> BookingResult<Option<Appointment>>;

    /// Stores `updated` with version `expected_version + 1`. Fails with
    /// `NotFound` when the appointment does not exist.
    async fn compare_and_swap(
        &self,
        expected_version: i64,
        updated: Appointment,
    ) -> BookingResult<CasOutcome>;

    /// Pending and confirmed appointments of a coach starting in `[from, until)`,
    /// earliest first.
    async fn active_for_coach_between(
        &self,
        coach_id: Uuid,
        from: OffsetDateTime,
        until: OffsetDateTime,
    ) -> BookingResult<Vec<Appointment>>;

    /// Newest first.
    async fn list_for_coach(&self, coach_id: Uuid) -> BookingResult<Vec<Appointment>>;

    /// Newest first.
    async fn list_for_student(&self, student_id: Uuid) -> BookingResult<Vec<Appointment>>;
}
