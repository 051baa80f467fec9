use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::booking::{AppointmentLedger, BookingError, BookingResult, CasOutcome};
use crate::db::Appointment;

const APPOINTMENT_COLUMNS: &str = "id, coach_id, student_id, datetime, duration_minutes, status, notes, \
     cancel_reason, cancelled_by, cancelled_at, hidden_from, version, created_at, updated_at";

/// Ledger backed by the `appointments` table. The partial unique index
/// `uq_appointments_active_slot` makes the slot check part of the INSERT.
#[derive(Debug, Clone)]
pub struct AppointmentRepository {
    pool: PgPool,
}

impl AppointmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AppointmentLedger for AppointmentRepository {
    async fn insert_if_slot_free(&self, appointment: Appointment) -> BookingResult<Appointment> {
        let sql = format!(
            r#"
            INSERT INTO appointments ({APPOINTMENT_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {APPOINTMENT_COLUMNS}
            "#
        );
        let result = sqlx::query_as::<_, Appointment>(&sql)
            .bind(appointment.id)
            .bind(appointment.coach_id)
            .bind(appointment.student_id)
            .bind(appointment.datetime)
            .bind(appointment.duration_minutes)
            .bind(appointment.status)
            .bind(&appointment.notes)
            .bind(&appointment.cancel_reason)
            .bind(appointment.cancelled_by)
            .bind(appointment.cancelled_at)
            .bind(&appointment.hidden_from)
            .bind(appointment.version)
            .bind(appointment.created_at)
            .bind(appointment.updated_at)
            .fetch_one(&self.pool)
            .await;

        match result {
            Ok(created) => Ok(created),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(BookingError::SlotAlreadyTaken {
                    coach_id: appointment.coach_id,
                    datetime: appointment.datetime,
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn get(&self, id: Uuid) -> BookingResult<Option<Appointment>> {
        let sql = format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = $1");
        Ok(sqlx::query_as::<_, Appointment>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn compare_and_swap(
        &self,
        expected_version: i64,
        updated: Appointment,
    ) -> BookingResult<CasOutcome> {
        let sql = format!(
            r#"
            UPDATE appointments
            SET
                status = $3,
                cancel_reason = $4,
                cancelled_by = $5,
                cancelled_at = $6,
                hidden_from = $7,
                updated_at = $8,
                version = version + 1
            WHERE id = $1 AND version = $2
            RETURNING {APPOINTMENT_COLUMNS}
            "#
        );
        let written = sqlx::query_as::<_, Appointment>(&sql)
            .bind(updated.id)
            .bind(expected_version)
            .bind(updated.status)
            .bind(&updated.cancel_reason)
            .bind(updated.cancelled_by)
            .bind(updated.cancelled_at)
            .bind(&updated.hidden_from)
            .bind(updated.updated_at)
            .fetch_optional(&self.pool)
            .await?;

        match written {
            Some(saved) => Ok(CasOutcome::Applied(saved)),
            None => match self.get(updated.id).await? {
                Some(current) => Ok(CasOutcome::Stale(current)),
                None => Err(BookingError::appointment_not_found(updated.id)),
            },
        }
    }

    async fn active_for_coach_between(
        &self,
        coach_id: Uuid,
        from: OffsetDateTime,
        until: OffsetDateTime,
    ) -> BookingResult<Vec<Appointment>> {
        let sql = format!(
            r#"
            SELECT {APPOINTMENT_COLUMNS}
            FROM appointments
            WHERE coach_id = $1
              AND datetime >= $2
              AND datetime < $3
              AND status IN ('pending', 'confirmed')
            ORDER BY datetime ASC
            "#
        );
        Ok(sqlx::query_as::<_, Appointment>(&sql)
            .bind(coach_id)
            .bind(from)
            .bind(until)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn list_for_coach(&self, coach_id: Uuid) -> BookingResult<Vec<Appointment>> {
        let sql = format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE coach_id = $1 \
             ORDER BY datetime DESC, created_at DESC"
        );
        Ok(sqlx::query_as::<_, Appointment>(&sql)
            .bind(coach_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn list_for_student(&self, student_id: Uuid) -> BookingResult<Vec<Appointment>> {
        let sql = format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE student_id = $1 \
             ORDER BY datetime DESC, created_at DESC"
        );
        Ok(sqlx::query_as::<_, Appointment>(&sql)
            .bind(student_id)
            .fetch_all(&self.pool)
            .await?)
    }
}
