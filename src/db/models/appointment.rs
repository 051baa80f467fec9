use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use std::fmt;
use time::{Duration, OffsetDateTime};
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "appointment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl AppointmentStatus {
    /// Pending and confirmed appointments hold their slot.
    pub fn is_active(self) -> bool {
        matches!(self, AppointmentStatus::Pending | AppointmentStatus::Confirmed)
    }

    /// Cancelled and completed appointments accept no further status change.
    pub fn is_terminal(self) -> bool {
        matches!(self, AppointmentStatus::Cancelled | AppointmentStatus::Completed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub coach_id: Uuid,
    pub student_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub datetime: OffsetDateTime,
    pub duration_minutes: i32,
    pub status: AppointmentStatus,
    pub notes: String,
    pub cancel_reason: Option<String>,
    pub cancelled_by: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub cancelled_at: Option<OffsetDateTime>,
    pub hidden_from: Vec<Uuid>,
    pub version: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Appointment {
    pub fn ends_at(&self) -> OffsetDateTime {
        self.datetime + Duration::minutes(i64::from(self.duration_minutes))
    }

    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.coach_id == user_id || self.student_id == user_id
    }

    pub fn is_hidden_for(&self, user_id: Uuid) -> bool {
        self.hidden_from.contains(&user_id)
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BookingRequest {
    pub coach_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub datetime: OffsetDateTime,
    #[validate(range(min = 1, max = 480, message = "Duration must be between 1 and 480 minutes"))]
    pub duration_minutes: Option<i32>,
    #[validate(length(max = 1000, message = "Notes must be at most 1000 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct CancelAppointmentPayload {
    #[validate(length(max = 500, message = "Cancel reason must be at most 500 characters"))]
    pub reason: Option<String>,
}
