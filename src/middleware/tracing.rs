use axum::{
    extract::{MatchedPath, Request},
    http::{HeaderMap, Method, Uri},
    middleware::Next,
    response::Response,
};
use opentelemetry::{
    global,
    trace::{Span, SpanKind, Status, Tracer},
    KeyValue,
};
use std::time::Instant;
use tracing::{info_span, Instrument};

use crate::middleware::identity::USER_ID_HEADER;

/// OpenTelemetry server span plus an `http_request` tracing span per request.
pub async fn observability_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let start_time = Instant::now();

    let tracer = global::tracer("http-server");
    let mut span = tracer
        .span_builder(format!("{} {}", method, route))
        .with_kind(SpanKind::Server)
        .start(&tracer);
    set_span_attributes(&mut span, &method, &uri, &route, request.headers());

    let tracing_span = info_span!(
        "http_request",
        method = %method,
        uri = %uri,
        route = %route,
        request_id = %uuid::Uuid::now_v7(),
    );

    let response = next.run(request).instrument(tracing_span.clone()).await;

    let duration = start_time.elapsed();
    let status_code = response.status().as_u16();

    span.set_attribute(KeyValue::new("http.status_code", status_code as i64));
    span.set_attribute(KeyValue::new("http.response_time_ms", duration.as_millis() as i64));
    if status_code >= 500 {
        span.set_status(Status::Error {
            description: format!("HTTP {}", status_code).into(),
        });
    } else {
        span.set_status(Status::Ok);
    }
    span.end();

    tracing_span.in_scope(|| {
        tracing::debug!(
            status = status_code,
            elapsed_ms = duration.as_millis() as u64,
            "Request finished"
        );
    });
    response
}

fn set_span_attributes(span: &mut impl Span, method: &Method, uri: &Uri, route: &str, headers: &HeaderMap) {
    span.set_attribute(KeyValue::new("http.method", method.to_string()));
    span.set_attribute(KeyValue::new("http.url", uri.to_string()));
    span.set_attribute(KeyValue::new("http.route", route.to_string()));

    if let Some(user_agent) = headers.get("user-agent").and_then(|v| v.to_str().ok()) {
        span.set_attribute(KeyValue::new("http.user_agent", user_agent.to_string()));
    }
    if let Some(forwarded_for) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        span.set_attribute(KeyValue::new("http.client_ip", forwarded_for.to_string()));
    }
    if let Some(user_id) = headers.get(USER_ID_HEADER).and_then(|v| v.to_str().ok()) {
        span.set_attribute(KeyValue::new("enduser.id", user_id.to_string()));
    }
}
