// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Outgoing mail for accepted submissions.
//!
//! The handler only sees [`MailSender`]; [`SmtpMailer`] is the production
//! implementation on top of lettre's async SMTP transport.

use crate::config::SmtpConfig;
use crate::sanitizer::{sanitize_html, to_plain_text};
use crate::secrets::SmtpCredentials;
use crate::validator::SanitizedSubmission;
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Invalid mailbox {0:?}")]
    InvalidMailbox(String),

    #[error("Failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

/// Delivers an accepted submission.
#[async_trait]
pub trait MailSender: Send + Sync {
    async fn send(
        &self,
        submission: &SanitizedSubmission,
        correlation_id: &str,
    ) -> Result<(), MailError>;
}

/// SMTP relay sender.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl SmtpMailer {
    /// Build the transport. No connection is made until the first send.
    pub fn new(config: &SmtpConfig, credentials: SmtpCredentials) -> Result<Self, MailError> {
        let from: Mailbox = config
            .from_address
            .parse()
            .map_err(|_| MailError::InvalidMailbox(config.from_address.clone()))?;
        let to: Mailbox = credentials
            .recipient
            .parse()
            .map_err(|_| MailError::InvalidMailbox(credentials.recipient.clone()))?;

        let builder = if config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
        };
        let transport = builder
            .port(config.port)
            .credentials(Credentials::new(credentials.username, credentials.password))
            .timeout(Some(config.timeout()))
            .build();

        Ok(Self { transport, from, to })
    }
}

#[async_trait]
impl MailSender for SmtpMailer {
    async fn send(
        &self,
        submission: &SanitizedSubmission,
        correlation_id: &str,
    ) -> Result<(), MailError> {
        let message = build_message(&self.from, &self.to, submission, correlation_id)?;
        let response = self.transport.send(message).await?;
        debug!(code = %response.code(), "SMTP relay accepted message");
        Ok(())
    }
}

/// Compose the notification email for a submission.
pub fn build_message(
    from: &Mailbox,
    to: &Mailbox,
    submission: &SanitizedSubmission,
    correlation_id: &str,
) -> Result<Message, MailError> {
    let mut builder = Message::builder()
        .from(from.clone())
        .to(to.clone())
        .subject(email_subject(submission))
        .header(ContentType::TEXT_HTML);

    match reply_to(submission) {
        Some(mailbox) => builder = builder.reply_to(mailbox),
        None => warn!(correlation_id, "Submitter address not usable as Reply-To"),
    }

    Ok(builder.body(render_body(submission, correlation_id))?)
}

fn reply_to(submission: &SanitizedSubmission) -> Option<Mailbox> {
    let address: Address = to_plain_text(submission.email()).parse().ok()?;
    Some(Mailbox::new(Some(to_plain_text(submission.name())), address))
}

/// `[Contact Form] <subject>` as plain text with control characters
/// flattened.
pub fn email_subject(submission: &SanitizedSubmission) -> String {
    let subject = submission
        .subject()
        .map_or_else(|| "New message".to_string(), to_plain_text);
    let flat: String = subject
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    format!("[Contact Form] {flat}")
}

/// HTML body. Field values are already markup-free and escaped; the final
/// pass keeps the template to the formatting allow-list.
pub fn render_body(submission: &SanitizedSubmission, correlation_id: &str) -> String {
    let message = submission
        .message()
        .lines()
        .collect::<Vec<_>>()
        .join("<br>");
    let html = format!(
        "<p><b>Name:</b> {name}</p>\
         <p><b>Email:</b> {email}</p>\
         <p><b>Subject:</b> {subject}</p>\
         <p><b>Message:</b><br>{message}</p>\
         <p><i>Request ID: {correlation_id}</i></p>",
        name = submission.name(),
        email = submission.email(),
        subject = submission.subject().unwrap_or("(none)"),
    );
    sanitize_html(&html)
}
