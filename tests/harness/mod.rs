// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Test harness for driving the contact form router in-process.
//!
//! Provides mail collaborators that record or fail, plus helpers for building
//! requests and decoding responses.

#![allow(dead_code)]

pub mod generators;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use contact_form_relay::{
    config::Config,
    handlers::{router, AppState},
    limiter::RateLimiter,
    mailer::{MailError, MailSender},
    metrics::Metrics,
    validator::SanitizedSubmission,
};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

pub const ALLOWED_ORIGIN: &str = "https://example.com";

/// Mail collaborator that keeps every message it is asked to send.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<(SanitizedSubmission, String)>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<(SanitizedSubmission, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailSender for RecordingMailer {
    async fn send(
        &self,
        submission: &SanitizedSubmission,
        correlation_id: &str,
    ) -> Result<(), MailError> {
        self.sent
            .lock()
            .unwrap()
            .push((submission.clone(), correlation_id.to_string()));
        Ok(())
    }
}

/// Mail collaborator whose relay is always down.
pub struct FailingMailer;

#[async_trait]
impl MailSender for FailingMailer {
    async fn send(&self, _: &SanitizedSubmission, _: &str) -> Result<(), MailError> {
        Err(MailError::InvalidMailbox("relay unavailable".to_string()))
    }
}

/// Mail collaborator that panics mid-send.
pub struct PanickingMailer;

#[async_trait]
impl MailSender for PanickingMailer {
    async fn send(&self, _: &SanitizedSubmission, _: &str) -> Result<(), MailError> {
        panic!("relay credentials missing at secret.rs:12");
    }
}

/// Configuration used by the tests: one allowed origin, client ids taken
/// from `X-Forwarded-For`.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.cors.allowed_origins = vec![ALLOWED_ORIGIN.to_string()];
    config.server.trust_forwarded_for = true;
    config
}

/// Fresh router and state for one test case.
pub fn app(mailer: Arc<dyn MailSender>, config: Config) -> (Router, Arc<AppState>) {
    let state = Arc::new(AppState {
        limiter: RateLimiter::new(config.rate_limit.clone()),
        mailer,
        metrics: Metrics::new().unwrap(),
        config,
    });
    (router(state.clone()), state)
}

/// Router with a recording mailer and the default test configuration.
pub fn recording_app() -> (Router, Arc<AppState>, Arc<RecordingMailer>) {
    let mailer = Arc::new(RecordingMailer::default());
    let (router, state) = app(mailer.clone(), test_config());
    (router, state, mailer)
}

pub fn request(method: Method, body: Body, origin: Option<&str>, client: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri("/contact-form")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", client);
    if let Some(origin) = origin {
        builder = builder.header(header::ORIGIN, origin);
    }
    builder.body(body).unwrap()
}

pub fn post_json(body: &Value, origin: Option<&str>, client: &str) -> Request<Body> {
    request(Method::POST, Body::from(body.to_string()), origin, client)
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// Run one request through the router.
pub async fn call(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    TestResponse {
        status,
        headers,
        body,
    }
}
