use axum::{
    body::Bytes,
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    response::Json,
};
use uuid::Uuid;
use validator::Validate;

use super::super::bad_request;
use crate::app_state::AppState;
use crate::booking::BookingError;
use crate::db::{Actor, Appointment, BookingRequest, CancelAppointmentPayload};
use crate::error::AppResult;
use crate::i18n::I18n;

pub async fn book_appointment(
    State(state): State<AppState>,
    i18n: I18n,
    actor: Actor,
    payload: Result<Json<BookingRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Appointment>)> {
    let Json(request) = payload.map_err(|e| bad_request(&i18n, e))?;
    let appointment = state
        .bookings
        .book(&actor, request)
        .await
        .map_err(|e| i18n.error(e))?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

pub async fn list_appointments(
    State(state): State<AppState>,
    i18n: I18n,
    actor: Actor,
) -> AppResult<Json<Vec<Appointment>>> {
    let appointments = state
        .bookings
        .list_for(&actor)
        .await
        .map_err(|e| i18n.error(e))?;
    Ok(Json(appointments))
}

pub async fn get_appointment(
    State(state): State<AppState>,
    i18n: I18n,
    actor: Actor,
    path: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<Appointment>> {
    let Path(id) = path.map_err(|e| bad_request(&i18n, e))?;
    let appointment = state
        .bookings
        .get(&actor, id)
        .await
        .map_err(|e| i18n.error(e))?;
    Ok(Json(appointment))
}

pub async fn confirm_appointment(
    State(state): State<AppState>,
    i18n: I18n,
    actor: Actor,
    path: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<Appointment>> {
    let Path(id) = path.map_err(|e| bad_request(&i18n, e))?;
    let appointment = state
        .bookings
        .confirm(&actor, id)
        .await
        .map_err(|e| i18n.error(e))?;
    Ok(Json(appointment))
}

/// The body is optional; `{"reason": "..."}` records why.
pub async fn cancel_appointment(
    State(state): State<AppState>,
    i18n: I18n,
    actor: Actor,
    path: Result<Path<Uuid>, PathRejection>,
    body: Bytes,
) -> AppResult<Json<Appointment>> {
    let Path(id) = path.map_err(|e| bad_request(&i18n, e))?;
    let payload = if body.iter().all(u8::is_ascii_whitespace) {
        CancelAppointmentPayload::default()
    } else {
        serde_json::from_slice::<CancelAppointmentPayload>(&body).map_err(|e| bad_request(&i18n, e))?
    };
    payload
        .validate()
        .map_err(|e| i18n.error(BookingError::from(e)))?;

    let reason = payload
        .reason
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());
    let appointment = state
        .bookings
        .cancel(&actor, id, reason)
        .await
        .map_err(|e| i18n.error(e))?;
    Ok(Json(appointment))
}

pub async fn complete_appointment(
    State(state): State<AppState>,
    i18n: I18n,
    actor: Actor,
    path: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<Appointment>> {
    let Path(id) = path.map_err(|e| bad_request(&i18n, e))?;
    let appointment = state
        .bookings
        .complete(&actor, id)
        .await
        .map_err(|e| i18n.error(e))?;
    Ok(Json(appointment))
}

pub async fn hide_appointment(
    State(state): State<AppState>,
    i18n: I18n,
    actor: Actor,
    path: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<Appointment>> {
    let Path(id) = path.map_err(|e| bad_request(&i18n, e))?;
    let appointment = state
        .bookings
        .hide(&actor, id)
        .await
        .map_err(|e| i18n.error(e))?;
    Ok(Json(appointment))
}
