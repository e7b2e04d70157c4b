// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Markup sanitizing for user-supplied text.
//!
//! Two modes:
//! - [`sanitize_text`]: no tags at all, used for every contact form field.
//! - [`sanitize_html`]: a small formatting allow-list (`p`, `br`, `b`, `i`,
//!   `u`) with no attributes, used on rendered email bodies.
//!
//! Both produce HTML-safe output and are idempotent. [`to_plain_text`]
//! turns strict-mode output back into plain text for contexts that are not
//! HTML (mail headers, the spam classifier).

use ammonia::Builder;
use std::collections::HashSet;

/// Tags kept by [`sanitize_html`].
pub const FORMATTING_TAGS: &[&str] = &["p", "br", "b", "i", "u"];

/// Elements removed together with their content.
const CONTENT_STRIPPED_TAGS: &[&str] = &["script", "style"];

fn builder(tags: &[&'static str]) -> Builder<'static> {
    let mut builder = Builder::empty();
    builder
        .tags(tags.iter().copied().collect::<HashSet<_>>())
        .clean_content_tags(CONTENT_STRIPPED_TAGS.iter().copied().collect::<HashSet<_>>())
        .strip_comments(true);
    builder
}

/// Remove all markup, keeping only the text content.
pub fn sanitize_text(input: &str) -> String {
    builder(&[]).clean(input).to_string()
}

/// Remove everything except bare formatting tags.
pub fn sanitize_html(input: &str) -> String {
    builder(FORMATTING_TAGS).clean(input).to_string()
}

/// Decode the entities [`sanitize_text`] emits.
///
/// Only valid on strict-mode output: there every literal `&` is already
/// `&amp;`, so `&amp;` is decoded last.
pub fn to_plain_text(sanitized: &str) -> String {
    sanitized
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&nbsp;", "\u{a0}")
        .replace("&amp;", "&")
}
