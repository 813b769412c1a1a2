//! Prompt handling for generative background replacement
//!
//! The prompt travels inside a URL path segment, so it is reduced to word characters,
//! whitespace, `-`, `.` and `,` and then percent-encoded component-style.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;
use std::sync::OnceLock;

pub const DEFAULT_PROMPT: &str = "Minimalist background with a soft pastel gradient even lighting";
pub const MAX_PROMPT_CHARS: usize = 500;

/// Characters left unescaped by URI-component encoding
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

fn disallowed() -> &'static Regex {
    static DISALLOWED: OnceLock<Regex> = OnceLock::new();
    DISALLOWED.get_or_init(|| {
        Regex::new(r"[^A-Za-z0-9_\s\-.,]").unwrap_or_else(|e| panic!("invalid prompt regex: {e}"))
    })
}

/// Trim the prompt and drop every character outside `[\w\s\-.,]`
pub fn sanitize(prompt: &str) -> String {
    disallowed().replace_all(prompt.trim(), "").into_owned()
}

/// Percent-encode a sanitized prompt for use in a transformation directive
pub fn encode(sanitized: &str) -> String {
    utf8_percent_encode(sanitized, COMPONENT).to_string()
}

/// Cap a draft prompt at the input limit, counting characters rather than bytes
pub fn clamp_draft(prompt: &str) -> String {
    prompt.chars().take(MAX_PROMPT_CHARS).collect()
}

/// `e_gen_background_replace:prompt_<encoded>` for the given prompt, or `None` when
/// nothing usable remains after sanitization
pub fn background_replace_directive(prompt: &str) -> Option<String> {
    let cleaned = sanitize(prompt);
    if cleaned.trim().is_empty() {
        return None;
    }
    Some(format!("e_gen_background_replace:prompt_{}", encode(&cleaned)))
}
