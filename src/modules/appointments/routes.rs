use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    book_appointment, cancel_appointment, complete_appointment, confirm_appointment,
    get_appointment, hide_appointment, list_appointments,
};
use crate::app_state::AppState;

pub fn appointment_routes() -> Router<AppState> {
    Router::new()
        .route("/appointments", get(list_appointments).post(book_appointment))
        .route("/appointments/{id}", get(get_appointment))
        .route("/appointments/{id}/confirm", post(confirm_appointment))
        .route("/appointments/{id}/cancel", post(cancel_appointment))
        .route("/appointments/{id}/complete", post(complete_appointment))
        .route("/appointments/{id}/hide", post(hide_appointment))
}
