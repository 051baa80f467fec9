//! Scheduling core of a coaching marketplace: weekly availability templates,
//! the appointment ledger, bookable slot reconciliation and the booking state
//! machine, served over an axum HTTP API.

pub mod app;
pub mod app_state;
pub mod booking;
pub mod config;
pub mod db;
pub mod error;
pub mod i18n;
pub mod middleware;
pub mod modules;
pub mod telemetry;
pub mod websocket;

pub use app::create_router;
pub use app_state::{AppState, Storage, StorageKind};
