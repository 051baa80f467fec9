use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::booking::BookingError;
use crate::i18n::{I18n, Localizer, SupportedLanguage};

/// Replaces the empty 504 of the timeout layer with the localized error body.
/// Must sit outside `TimeoutLayer` and inside `language_middleware`.
pub async fn timeout_envelope_middleware(
    State(localizer): State<Arc<Localizer>>,
    request: Request,
    next: Next,
) -> Response {
    let language = request
        .extensions()
        .get::<SupportedLanguage>()
        .copied()
        .unwrap_or_default();
    let path = request.uri().path().to_owned();

    let response = next.run(request).await;
    if !is_layer_timeout(&response) {
        return response;
    }

    tracing::warn!(%path, "Request exceeded the configured timeout");
    I18n::new(localizer, language)
        .error(BookingError::Timeout)
        .into_response()
}

// Handler errors always carry a JSON body, the layer's own response never does.
fn is_layer_timeout(response: &Response) -> bool {
    response.status() == StatusCode::GATEWAY_TIMEOUT
        && !response.headers().contains_key(header::CONTENT_TYPE)
}
