// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prometheus counters for submission outcomes.

use prometheus::{Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

/// How a request to the form endpoint ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Accepted,
    Spam,
    Invalid,
    RateLimited,
    MethodNotAllowed,
    MailFailed,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::Spam => "spam",
            Self::Invalid => "invalid",
            Self::RateLimited => "rate_limited",
            Self::MethodNotAllowed => "method_not_allowed",
            Self::MailFailed => "mail_failed",
        }
    }
}

/// Metrics registry owned by the service.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    submissions: IntCounterVec,
    tracked_clients: IntGauge,
}

impl Metrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();
        let submissions = IntCounterVec::new(
            Opts::new(
                "contact_form_submissions_total",
                "Contact form requests by outcome",
            ),
            &["outcome"],
        )?;
        let tracked_clients = IntGauge::new(
            "contact_form_rate_limit_clients",
            "Client ids currently held by the rate limiter",
        )?;
        registry.register(Box::new(submissions.clone()))?;
        registry.register(Box::new(tracked_clients.clone()))?;
        Ok(Self {
            registry,
            submissions,
            tracked_clients,
        })
    }

    pub fn record(&self, outcome: Outcome) {
        self.submissions.with_label_values(&[outcome.as_str()]).inc();
    }

    pub fn count(&self, outcome: Outcome) -> u64 {
        self.submissions.with_label_values(&[outcome.as_str()]).get()
    }

    pub fn set_tracked_clients(&self, n: usize) {
        self.tracked_clients.set(n as i64);
    }

    /// Render all metrics in the Prometheus text format.
    pub fn render(&self) -> prometheus::Result<String> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_render() {
        let metrics = Metrics::new().unwrap();
        metrics.record(Outcome::Accepted);
        metrics.record(Outcome::Spam);
        metrics.record(Outcome::Spam);
        metrics.set_tracked_clients(3);

        assert_eq!(metrics.count(Outcome::Spam), 2);
        let text = metrics.render().unwrap();
        assert!(text.contains(r#"contact_form_submissions_total{outcome="spam"} 2"#));
        assert!(text.contains(r#"contact_form_submissions_total{outcome="accepted"} 1"#));
        assert!(text.contains("contact_form_rate_limit_clients 3"));
    }

    #[test]
    fn test_registries_are_independent() {
        let a = Metrics::new().unwrap();
        let b = Metrics::new().unwrap();
        a.record(Outcome::Invalid);
        assert_eq!(b.count(Outcome::Invalid), 0);
    }
}
