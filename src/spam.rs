// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Heuristic spam detection.
//!
//! A fixed, ordered set of checks; the first one that matches decides. There
//! is no scoring and no feedback loop.

use regex::Regex;
use std::sync::OnceLock;

/// Phrases that mark a submission as spam, matched case-insensitively.
pub const SPAM_PHRASES: &[&str] = &[
    "viagra",
    "cialis",
    "casino",
    "lottery",
    "free money",
    "click here",
    "buy now",
    "make money fast",
    "work from home",
    "weight loss",
    "crypto",
    "bitcoin",
    "act now",
    "limited time offer",
    "winner",
];

/// Number of links at which a message is considered spam.
pub const MAX_LINKS: usize = 3;

/// Length of a single-character run that counts as spam.
pub const REPEATED_CHAR_RUN: usize = 11;

/// Length of a non-ASCII run that counts as spam.
pub const NON_ASCII_RUN: usize = 20;

/// Which heuristic fired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpamSignal {
    Phrase(&'static str),
    TooManyLinks(usize),
    RepeatedCharacter(char),
    NonAsciiRun,
}

impl std::fmt::Display for SpamSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Phrase(p) => write!(f, "spam phrase {p:?}"),
            Self::TooManyLinks(n) => write!(f, "{n} links"),
            Self::RepeatedCharacter(c) => write!(f, "repeated character {c:?}"),
            Self::NonAsciiRun => write!(f, "long non-ASCII run"),
        }
    }
}

fn link_pattern() -> &'static Regex {
    static LINK: OnceLock<Regex> = OnceLock::new();
    LINK.get_or_init(|| Regex::new(r"(?i)https?://|www\.").expect("static link pattern"))
}

/// Return the first heuristic that matches `text`, if any.
pub fn classify(text: &str) -> Option<SpamSignal> {
    let lower = text.to_lowercase();
    if let Some(phrase) = SPAM_PHRASES.iter().find(|p| lower.contains(*p)) {
        return Some(SpamSignal::Phrase(phrase));
    }

    let links = link_pattern().find_iter(text).count();
    if links >= MAX_LINKS {
        return Some(SpamSignal::TooManyLinks(links));
    }

    if let Some(c) = repeated_character(text) {
        return Some(SpamSignal::RepeatedCharacter(c));
    }

    if has_non_ascii_run(text) {
        return Some(SpamSignal::NonAsciiRun);
    }

    None
}

/// True when any heuristic matches.
pub fn is_spam(text: &str) -> bool {
    classify(text).is_some()
}

fn repeated_character(text: &str) -> Option<char> {
    let mut prev = None;
    let mut run = 0;
    for c in text.chars() {
        if Some(c) == prev {
            run += 1;
        } else {
            prev = Some(c);
            run = 1;
        }
        if run >= REPEATED_CHAR_RUN {
            return Some(c);
        }
    }
    None
}

fn has_non_ascii_run(text: &str) -> bool {
    let mut run = 0;
    for c in text.chars() {
        if c.is_ascii() {
            run = 0;
        } else {
            run += 1;
            if run >= NON_ASCII_RUN {
                return true;
            }
        }
    }
    false
}
