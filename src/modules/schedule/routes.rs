use axum::{routing::get, Router};

use super::handlers::{get_calendar, get_schedule, get_slots, update_schedule};
use crate::app_state::AppState;

pub fn schedule_routes() -> Router<AppState> {
    Router::new()
        .route("/coaches/{coach_id}/schedule", get(get_schedule).put(update_schedule))
        .route("/coaches/{coach_id}/slots", get(get_slots))
        .route("/coaches/{coach_id}/calendar", get(get_calendar))
}
