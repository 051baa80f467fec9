use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    response::Json,
};
use serde::{Deserialize, Serialize};
use time::Date;
use uuid::Uuid;

use super::super::bad_request;
use crate::app_state::AppState;
use crate::booking::{CandidateSlot, DaySlots};
use crate::db::{iso_date, Actor, ScheduleTemplate, UpdateSchedulePayload};
use crate::error::AppResult;
use crate::i18n::I18n;

#[derive(Debug, Deserialize)]
pub struct SlotsQuery {
    #[serde(with = "iso_date")]
    pub date: Date,
    #[serde(default)]
    pub include_booked: bool,
}

#[derive(Debug, Serialize)]
pub struct SlotsResponse {
    pub coach_id: Uuid,
    #[serde(with = "iso_date")]
    pub date: Date,
    pub slots: Vec<CandidateSlot>,
}

#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    #[serde(default, with = "iso_date::option")]
    pub from: Option<Date>,
    pub days: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct CalendarResponse {
    pub coach_id: Uuid,
    pub days: Vec<DaySlots>,
}

pub async fn get_schedule(
    State(state): State<AppState>,
    i18n: I18n,
    path: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<ScheduleTemplate>> {
    let Path(coach_id) = path.map_err(|e| bad_request(&i18n, e))?;
    let template = state
        .schedules
        .get_template(coach_id)
        .await
        .map_err(|e| i18n.error(e))?;
    Ok(Json(template))
}

pub async fn update_schedule(
    State(state): State<AppState>,
    i18n: I18n,
    actor: Actor,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateSchedulePayload>, JsonRejection>,
) -> AppResult<Json<ScheduleTemplate>> {
    let Path(coach_id) = path.map_err(|e| bad_request(&i18n, e))?;
    let Json(payload) = payload.map_err(|e| bad_request(&i18n, e))?;
    let template = state
        .schedules
        .update_template(&actor, coach_id, payload.days)
        .await
        .map_err(|e| i18n.error(e))?;
    Ok(Json(template))
}

/// Bookable slots of one day; `include_booked=true` returns the full board.
pub async fn get_slots(
    State(state): State<AppState>,
    i18n: I18n,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<SlotsQuery>, QueryRejection>,
) -> AppResult<Json<SlotsResponse>> {
    let Path(coach_id) = path.map_err(|e| bad_request(&i18n, e))?;
    let Query(query) = query.map_err(|e| bad_request(&i18n, e))?;

    let slots = if query.include_booked {
        state.availability.slot_board(coach_id, query.date).await
    } else {
        state.availability.available_slots(coach_id, query.date).await
    }
    .map_err(|e| i18n.error(e))?;

    Ok(Json(SlotsResponse {
        coach_id,
        date: query.date,
        slots,
    }))
}

pub async fn get_calendar(
    State(state): State<AppState>,
    i18n: I18n,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<CalendarQuery>, QueryRejection>,
) -> AppResult<Json<CalendarResponse>> {
    let Path(coach_id) = path.map_err(|e| bad_request(&i18n, e))?;
    let Query(query) = query.map_err(|e| bad_request(&i18n, e))?;
    let days = state
        .availability
        .calendar(coach_id, query.from, query.days)
        .await
        .map_err(|e| i18n.error(e))?;
    Ok(Json(CalendarResponse { coach_id, days }))
}
