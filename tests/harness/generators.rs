// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Test data generators.

use serde_json::{json, Value};

/// A submission that passes every check.
pub fn valid_submission() -> Value {
    json!({
        "name": "Jane Doe",
        "email": "jane@example.com",
        "subject": "Project enquiry",
        "message": "Hello, I would like to talk about a new website."
    })
}

/// Generate distinct client addresses in the 10.x.x.x range.
pub fn generate_clients(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| format!("10.{}.{}.{}", (i >> 16) & 0xFF, (i >> 8) & 0xFF, i & 0xFF))
        .collect()
}

/// Markup injection payloads.
pub fn xss_payloads() -> Vec<&'static str> {
    vec![
        "<script>alert(1)</script>",
        "<img src=x onerror=alert(1)>",
        "<svg/onload=alert(1)>",
        "<a href=\"javascript:alert(1)\">click</a>",
        "<iframe src=\"https://evil.example\"></iframe>",
        "<body onload=alert(1)>",
        "<scr<script>ipt>alert(1)</script>",
        "<div style=\"background:url(javascript:alert(1))\">x</div>",
        "<!--<script>alert(1)</script>-->",
        "<math><mtext><table><mglyph><style><img src=x onerror=alert(1)>",
    ]
}

/// Messages that must be filtered as spam.
pub fn spam_messages() -> Vec<String> {
    vec![
        "Click here for free money and casino winnings!".to_string(),
        "Cheap VIAGRA delivered to your door today".to_string(),
        "Visit http://a.example http://b.example http://c.example now".to_string(),
        format!("Hello {}", "!".repeat(15)),
        format!("Greetings {}", "пример".repeat(4)),
    ]
}

/// Origins that must never receive CORS headers.
pub fn hostile_origins() -> Vec<&'static str> {
    vec![
        "https://malicious-site.com",
        "https://example.com.attacker.net",
        "https://evil-example.com",
        "http://example.com",
        "null",
    ]
}
