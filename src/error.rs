use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::booking::BookingError;
use crate::i18n::{I18n, MessageArgs};
use crate::i18n_args;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Booking(#[from] BookingError),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Fluent keys of every error message a response can carry.
pub const ERROR_MESSAGE_KEYS: &[&str] = &[
    "error-invalid-template",
    "error-slot-already-taken",
    "error-unauthorized",
    "error-invalid-transition",
    "error-contended",
    "error-not-found",
    "error-validation",
    "error-storage",
    "error-timeout",
    "error-authentication",
    "error-bad-request",
];

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Booking(err) => match err {
                BookingError::InvalidTemplate(_) => StatusCode::UNPROCESSABLE_ENTITY,
                BookingError::SlotAlreadyTaken { .. } => StatusCode::CONFLICT,
                BookingError::Unauthorized(_) => StatusCode::FORBIDDEN,
                BookingError::InvalidTransition { .. } => StatusCode::CONFLICT,
                BookingError::Contended(_) => StatusCode::CONFLICT,
                BookingError::NotFound(_) => StatusCode::NOT_FOUND,
                BookingError::Validation(_) => StatusCode::BAD_REQUEST,
                BookingError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
                BookingError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            },
            AppError::Authentication(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Booking(err) => err.code(),
            AppError::Authentication(_) => "authentication",
            AppError::BadRequest(_) => "bad_request",
        }
    }

    fn message_key(&self) -> String {
        format!("error-{}", self.code().replace('_', "-"))
    }

    fn message_args(&self) -> Option<MessageArgs> {
        match self {
            AppError::Booking(BookingError::InvalidTransition { from, action }) => Some(i18n_args!(
                "status" => from.as_str(),
                "action" => action.as_str(),
            )),
            _ => None,
        }
    }

    /// Internal failures keep their cause in the log only.
    fn details(&self) -> Option<String> {
        if self.status().is_server_error() && self.status() != StatusCode::GATEWAY_TIMEOUT {
            None
        } else {
            Some(self.to_string())
        }
    }
}

/// An `AppError` paired with the message in the caller's language.
#[derive(Debug)]
pub struct LocalizedError {
    pub error: AppError,
    pub message: String,
}

impl LocalizedError {
    pub fn new(error: AppError, i18n: &I18n) -> Self {
        let key = error.message_key();
        let message = match error.message_args() {
            Some(args) => i18n.get_with_args(&key, &args),
            None => i18n.get(&key),
        };
        Self { error, message }
    }
}

impl IntoResponse for LocalizedError {
    fn into_response(self) -> Response {
        let status = self.error.status();
        if status.is_server_error() {
            tracing::error!(code = self.error.code(), error = %self.error, "Request failed");
        } else {
            tracing::debug!(code = self.error.code(), error = %self.error, "Request rejected");
        }

        let body = Json(json!({
            "error": {
                "code": self.error.code(),
                "message": self.message,
                "details": self.error.details(),
            }
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, LocalizedError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::Transition;
    use crate::db::{AppointmentStatus, DatabaseError};
    use crate::i18n::{init_i18n, SupportedLanguage};
    use std::sync::Arc;
    use time::macros::datetime;
    use uuid::Uuid;

    fn i18n(language: SupportedLanguage) -> I18n {
        I18n::new(Arc::new(init_i18n().unwrap()), language)
    }

    #[test]
    fn maps_booking_errors_to_status_codes() {
        let cases = [
            (BookingError::InvalidTemplate("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (
                BookingError::SlotAlreadyTaken {
                    coach_id: Uuid::nil(),
                    datetime: datetime!(2025-03-10 10:00 UTC),
                },
                StatusCode::CONFLICT,
            ),
            (BookingError::Unauthorized("x".into()), StatusCode::FORBIDDEN),
            (
                BookingError::InvalidTransition {
                    from: AppointmentStatus::Cancelled,
                    action: Transition::Confirm,
                },
                StatusCode::CONFLICT,
            ),
            (BookingError::Contended(Uuid::nil()), StatusCode::CONFLICT),
            (BookingError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (BookingError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (
                BookingError::Storage(DatabaseError::Sqlx(sqlx::Error::RowNotFound)),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (BookingError::Timeout, StatusCode::GATEWAY_TIMEOUT),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).status(), status);
        }
    }

    #[test]
    fn conflict_and_stale_state_have_distinct_codes() {
        let taken = AppError::from(BookingError::SlotAlreadyTaken {
            coach_id: Uuid::nil(),
            datetime: datetime!(2025-03-10 10:00 UTC),
        });
        let stale = AppError::from(BookingError::InvalidTransition {
            from: AppointmentStatus::Confirmed,
            action: Transition::Confirm,
        });
        assert_eq!(taken.status(), stale.status());
        assert_ne!(taken.code(), stale.code());
    }

    #[test]
    fn slot_taken_message_is_localized() {
        let err = BookingError::SlotAlreadyTaken {
            coach_id: Uuid::nil(),
            datetime: datetime!(2025-03-10 10:00 UTC),
        };
        let tr = i18n(SupportedLanguage::Turkish).error(err);
        assert_eq!(tr.message, "Bu saat dolu, lütfen başka bir saat seçin.");

        let err = BookingError::Validation("bad".into());
        let en = i18n(SupportedLanguage::English).error(err);
        assert!(!en.message.starts_with("error-"));
    }

    #[test]
    fn invalid_transition_message_names_the_state() {
        let err = BookingError::InvalidTransition {
            from: AppointmentStatus::Cancelled,
            action: Transition::Confirm,
        };
        let en = i18n(SupportedLanguage::English).error(err);
        assert!(en.message.contains("cancelled"), "{}", en.message);
    }

    #[test]
    fn storage_details_stay_out_of_the_body() {
        let err = AppError::from(BookingError::Storage(DatabaseError::Sqlx(
            sqlx::Error::Protocol("row 42".into()),
        )));
        assert!(err.details().is_none());
        assert!(AppError::BadRequest("x".into()).details().is_some());
    }
}
