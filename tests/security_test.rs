// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Security tests for the contact form endpoint.
//!
//! These simulate hostile callers and check that the filters hold: markup
//! never reaches the outgoing mail, foreign origins never get CORS headers,
//! and the rate limit holds under concurrent load.

mod harness;

use axum::{
    body::Body,
    http::{header, Method, StatusCode},
};
use harness::{generators, ALLOWED_ORIGIN};
use serde_json::json;

#[tokio::test]
async fn test_markup_never_reaches_mail() {
    let payloads = generators::xss_payloads();
    let clients = generators::generate_clients(payloads.len());

    for (payload, client) in payloads.iter().zip(&clients) {
        let (app, _, mailer) = harness::recording_app();
        let mut body = generators::valid_submission();
        body["message"] = json!(format!("Please read this: {payload}"));
        body["subject"] = json!(payload);

        let res = harness::call(&app, harness::post_json(&body, None, client)).await;
        assert_eq!(res.status, StatusCode::OK, "payload {payload}");

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1, "payload {payload}");
        let (submission, _) = &sent[0];
        for text in [submission.message(), submission.subject().unwrap_or("")] {
            assert!(!text.contains('<'), "payload {payload} leaked markup: {text}");
        }
    }
}

#[tokio::test]
async fn test_markup_in_name_is_rejected() {
    let (app, _, mailer) = harness::recording_app();
    let mut body = generators::valid_submission();
    body["name"] = json!("<script>alert(1)</script>John");

    let res = harness::call(&app, harness::post_json(&body, None, "10.9.9.9")).await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["details"][0]["field"], "name");
    assert!(!res.body.to_string().contains("<script>"));
    assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn test_hostile_origins_never_get_cors_headers() {
    for origin in generators::hostile_origins() {
        let (app, _, _) = harness::recording_app();
        let client = "10.1.1.1";

        let mut spam = generators::valid_submission();
        spam["message"] = json!("Cheap viagra, buy now!!");

        let mut requests = vec![
            harness::post_json(&generators::valid_submission(), Some(origin), client),
            harness::post_json(&json!({"name": ""}), Some(origin), client),
            harness::post_json(&spam, Some(origin), client),
            harness::request(Method::OPTIONS, Body::empty(), Some(origin), client),
            harness::request(Method::GET, Body::empty(), Some(origin), client),
        ];
        // Exhaust the limit so the 429 path is covered as well.
        for _ in 0..4 {
            requests.push(harness::post_json(
                &generators::valid_submission(),
                Some(origin),
                client,
            ));
        }

        let mut statuses = Vec::new();
        for request in requests {
            let res = harness::call(&app, request).await;
            assert!(
                !res.headers.contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN),
                "{origin} got CORS headers on {}",
                res.status
            );
            assert!(!res.headers.contains_key(header::ACCESS_CONTROL_ALLOW_METHODS));
            statuses.push(res.status);
        }

        // The server still processed the request even though the browser
        // will hide the response.
        assert_eq!(statuses[0], StatusCode::OK);
        assert_eq!(statuses[1], StatusCode::BAD_REQUEST);
        assert!(statuses.contains(&StatusCode::TOO_MANY_REQUESTS));
    }
}

#[tokio::test]
async fn test_forwarded_for_ignored_unless_trusted() {
    let mut config = harness::test_config();
    config.server.trust_forwarded_for = false;
    let mailer = std::sync::Arc::new(harness::RecordingMailer::default());
    let (app, _) = harness::app(mailer, config);

    // Rotating the header must not buy extra requests.
    let clients = generators::generate_clients(10);
    let mut limited = 0;
    for client in &clients {
        let res = harness::call(
            &app,
            harness::post_json(&generators::valid_submission(), None, client),
        )
        .await;
        if res.status == StatusCode::TOO_MANY_REQUESTS {
            limited += 1;
        }
    }
    assert_eq!(limited, 5);
}

#[tokio::test]
async fn test_distributed_clients_each_get_their_quota() {
    let (app, _, mailer) = harness::recording_app();
    let clients = generators::generate_clients(20);

    for client in &clients {
        for _ in 0..6 {
            harness::call(
                &app,
                harness::post_json(&generators::valid_submission(), Some(ALLOWED_ORIGIN), client),
            )
            .await;
        }
    }

    assert_eq!(mailer.sent().len(), 20 * 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_flood_from_one_client() {
    let (app, _, mailer) = harness::recording_app();

    let tasks: Vec<_> = (0..40)
        .map(|_| {
            let app = app.clone();
            tokio::spawn(async move {
                harness::call(
                    &app,
                    harness::post_json(&generators::valid_submission(), None, "10.200.0.1"),
                )
                .await
                .status
            })
        })
        .collect();

    let mut ok = 0;
    let mut limited = 0;
    for task in tasks {
        match task.await.unwrap() {
            StatusCode::OK => ok += 1,
            StatusCode::TOO_MANY_REQUESTS => limited += 1,
            other => panic!("unexpected status {other}"),
        }
    }

    assert_eq!(ok, 5);
    assert_eq!(limited, 35);
    assert_eq!(mailer.sent().len(), 5);
}

#[tokio::test]
async fn test_spam_variants_are_silently_dropped() {
    for (i, message) in generators::spam_messages().into_iter().enumerate() {
        let (app, _, mailer) = harness::recording_app();
        let mut body = generators::valid_submission();
        body["message"] = json!(message);

        let res = harness::call(
            &app,
            harness::post_json(&body, Some(ALLOWED_ORIGIN), &format!("10.3.0.{i}")),
        )
        .await;

        assert_eq!(res.status, StatusCode::OK, "{message}");
        assert_eq!(res.body["success"], true);
        assert!(mailer.sent().is_empty(), "{message} was sent");
    }
}
