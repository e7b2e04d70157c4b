// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Contact Form Relay
//!
//! A single HTTP endpoint that accepts contact form submissions and relays
//! accepted ones to a mailbox over SMTP:
//!
//! - Per-client sliding-window rate limiting (5 per 15 minutes default)
//! - Exhaustive field validation with per-field error details
//! - Markup stripping on every field
//! - Heuristic spam filtering (spam is answered like a success)
//! - Origin allow-list for CORS headers

pub mod config;
pub mod cors;
pub mod error;
pub mod handlers;
pub mod limiter;
pub mod mailer;
pub mod metrics;
pub mod sanitizer;
pub mod secrets;
pub mod spam;
pub mod validator;

pub use config::Config;
pub use error::ApiError;
pub use handlers::{router, AppState};
pub use limiter::{RateLimitResult, RateLimiter};
pub use mailer::{MailError, MailSender};
pub use validator::{FieldError, SanitizedSubmission};
