// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! HTTP handlers for the contact form relay.
//!
//! One route runs the whole pipeline: method gate, rate limit, validation
//! and sanitizing, spam check, then the mail send. Every step ends the
//! request on failure; nothing is retried.

use crate::config::Config;
use crate::cors::{apply_cors, CorsPolicy, SECURITY_HEADERS};
use crate::error::ApiError;
use crate::limiter::{RateLimitResult, RateLimiter};
use crate::mailer::MailSender;
use crate::metrics::{Metrics, Outcome};
use crate::spam;
use crate::validator::{validate_submission, FieldError};
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, ConnectInfo, DefaultBodyLimit, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde::Serialize;
use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    catch_panic::CatchPanicLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

pub const SUCCESS_MESSAGE: &str = "Thank you for your message. We'll get back to you soon!";

/// Shared application state.
pub struct AppState {
    pub limiter: RateLimiter,
    pub mailer: Arc<dyn MailSender>,
    pub metrics: Metrics,
    pub config: Config,
}

/// Body of an accepted (or silently dropped) submission.
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: &'static str,
    pub id: String,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Build the service router.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = Arc::new(CorsPolicy::new(state.config.cors.allowed_origins.as_slice()));

    let form = Router::new()
        .route(&state.config.server.form_path, any(contact_form))
        .layer(middleware::from_fn_with_state(cors, apply_cors));

    let mut app = Router::new().route("/health", get(health)).merge(form);
    if state.config.metrics.enabled {
        app = app.route(&state.config.metrics.path, get(metrics));
    }

    let mut app = app
        .layer(DefaultBodyLimit::max(state.config.server.max_body_bytes))
        .layer(CatchPanicLayer::custom(panic_response));
    for (name, value) in SECURITY_HEADERS {
        app = app.layer(SetResponseHeaderLayer::overriding(
            name,
            HeaderValue::from_static(value),
        ));
    }

    app.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "contact-form-relay",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Prometheus scrape endpoint.
pub async fn metrics(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    state
        .metrics
        .set_tracked_clients(state.limiter.tracked_clients().await);
    let body = state
        .metrics
        .render()
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response())
}

/// Contact form endpoint. Accepts any method so that non-POST requests get
/// the uniform error body instead of an empty 405.
pub async fn contact_form(
    State(state): State<Arc<AppState>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    method: Method,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4().to_string();
    let span = info_span!("contact_form", request_id = %correlation_id, %method);

    async move {
        let (outcome, response) =
            process(&state, connect_info, &method, &headers, &body, correlation_id).await;
        if let Some(outcome) = outcome {
            state.metrics.record(outcome);
        }
        response
    }
    .instrument(span)
    .await
}

async fn process(
    state: &AppState,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    method: &Method,
    headers: &HeaderMap,
    body: &Result<Bytes, BytesRejection>,
    correlation_id: String,
) -> (Option<Outcome>, Response) {
    if method == Method::OPTIONS {
        return (None, StatusCode::OK.into_response());
    }
    if method != Method::POST {
        debug!("Rejecting unsupported method");
        return (
            Some(Outcome::MethodNotAllowed),
            ApiError::MethodNotAllowed.into_response(),
        );
    }

    let client = client_id(
        headers,
        connect_info.as_ref().map(|c| c.0),
        state.config.server.trust_forwarded_for,
    );

    if let RateLimitResult::Limited { retry_after } = state.limiter.check(&client).await {
        info!(
            client = %client,
            retry_after_secs = retry_after.as_secs(),
            "Request rate limited"
        );
        return (
            Some(Outcome::RateLimited),
            ApiError::RateLimited { retry_after }.into_response(),
        );
    }

    let body = match body {
        Ok(body) => body,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            let limit = state.config.server.max_body_bytes;
            info!(limit, "Request body too large");
            return (
                Some(Outcome::Invalid),
                ApiError::PayloadTooLarge { limit }.into_response(),
            );
        }
        Err(rejection) => {
            info!(error = %rejection, "Failed to read request body");
            return (
                Some(Outcome::Invalid),
                ApiError::Validation(vec![FieldError::new(
                    "body",
                    "Request body could not be read",
                )])
                .into_response(),
            );
        }
    };

    let input: serde_json::Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(e) => {
            info!(error = %e, "Request body is not valid JSON");
            return (
                Some(Outcome::Invalid),
                ApiError::Validation(vec![FieldError::new(
                    "body",
                    "Request body must be valid JSON",
                )])
                .into_response(),
            );
        }
    };

    let submission = match validate_submission(&input) {
        Ok(submission) => submission,
        Err(errors) => {
            let fields: Vec<&str> = errors.iter().map(|e| e.field).collect();
            info!(?fields, "Validation failed");
            return (
                Some(Outcome::Invalid),
                ApiError::Validation(errors).into_response(),
            );
        }
    };

    if let Some(signal) = spam::classify(&submission.spam_corpus()) {
        // Answer exactly like an accepted submission.
        warn!(client = %client, %signal, "Submission classified as spam, not sending");
        return (Some(Outcome::Spam), success(correlation_id));
    }

    match state.mailer.send(&submission, &correlation_id).await {
        Ok(()) => {
            info!(client = %client, "Contact form message sent");
            (Some(Outcome::Accepted), success(correlation_id))
        }
        Err(e) => {
            error!(error = %e, "Failed to send contact form message");
            (
                Some(Outcome::MailFailed),
                ApiError::Internal(e.to_string()).into_response(),
            )
        }
    }
}

fn success(id: String) -> Response {
    (
        StatusCode::OK,
        Json(SuccessResponse {
            success: true,
            message: SUCCESS_MESSAGE,
            id,
        }),
    )
        .into_response()
}

/// Identify the caller for rate limiting.
///
/// `X-Forwarded-For` is only honoured when the service sits behind a proxy
/// that sets it; otherwise any client could pick its own key.
pub fn client_id(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trust_forwarded_for: bool,
) -> String {
    if trust_forwarded_for {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(ip) = forwarded {
            return ip.to_string();
        }
    }
    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    error!(panic = %detail, "Handler panicked");
    ApiError::Internal(detail).into_response()
}
