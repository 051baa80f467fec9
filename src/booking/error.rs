use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use super::transitions::Transition;
use crate::db::{AppointmentStatus, DatabaseError};

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("Invalid availability template: {0}")]
    InvalidTemplate(String),

    #[error("Coach {coach_id} already has an active appointment at {datetime}")]
    SlotAlreadyTaken {
        coach_id: Uuid,
        datetime: OffsetDateTime,
    },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Cannot {action} an appointment that is {from}")]
    InvalidTransition {
        from: AppointmentStatus,
        action: Transition,
    },

    #[error("Appointment {0} kept changing during the update, retry")]
    Contended(Uuid),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(#[from] DatabaseError),

    #[error("Ledger operation timed out")]
    Timeout,
}

impl BookingError {
    /// Stable identifier clients switch on.
    pub fn code(&self) -> &'static str {
        match self {
            BookingError::InvalidTemplate(_) => "invalid_template",
            BookingError::SlotAlreadyTaken { .. } => "slot_already_taken",
            BookingError::Unauthorized(_) => "unauthorized",
            BookingError::InvalidTransition { .. } => "invalid_transition",
            BookingError::Contended(_) => "contended",
            BookingError::NotFound(_) => "not_found",
            BookingError::Validation(_) => "validation",
            BookingError::Storage(_) => "storage",
            BookingError::Timeout => "timeout",
        }
    }

    pub fn appointment_not_found(id: Uuid) -> Self {
        BookingError::NotFound(format!("appointment {}", id))
    }

    pub fn coach_not_found(id: Uuid) -> Self {
        BookingError::NotFound(format!("coach {}", id))
    }
}

impl From<sqlx::Error> for BookingError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => BookingError::Timeout,
            err => BookingError::Storage(DatabaseError::Sqlx(err)),
        }
    }
}

impl From<validator::ValidationErrors> for BookingError {
    fn from(errors: validator::ValidationErrors) -> Self {
        BookingError::Validation(errors.to_string())
    }
}

pub type BookingResult<T> = Result<T, BookingError>;
