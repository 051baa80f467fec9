//! Caller identity as forwarded by the upstream identity proxy.

use axum::{extract::FromRequestParts, http::request::Parts, http::HeaderMap};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::db::{Actor, UserRole};
use crate::error::{AppError, LocalizedError};
use crate::i18n::I18n;

pub const USER_ID_HEADER: &str = "X-User-Id";
pub const USER_ROLE_HEADER: &str = "X-User-Role";

pub fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, AppError> {
    let user_id = header_str(headers, USER_ID_HEADER)?;
    let user_id = Uuid::parse_str(user_id)
        .map_err(|_| AppError::Authentication(format!("{} is not a valid id", USER_ID_HEADER)))?;

    let role = header_str(headers, USER_ROLE_HEADER)?
        .parse::<UserRole>()
        .map_err(AppError::Authentication)?;

    Ok(Actor::new(user_id, role))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, AppError> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::Authentication(format!("missing {} header", name)))
}

impl FromRequestParts<AppState> for Actor {
    type Rejection = LocalizedError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        actor_from_headers(&parts.headers)
            .map_err(|err| I18n::from_parts(parts, state.localizer.clone()).error(err))
    }
}
