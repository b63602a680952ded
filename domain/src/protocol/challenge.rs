//! Bot-detection challenge recognition.
//!
//! A challenged landing page answers 403 with a tiny script that calls
//! `fetch('/__rd_verify_...')`. POSTing to that path once clears the check.

use regex::Regex;
use std::sync::LazyLock;

/// Substring identifying a challenge page.
pub const CHALLENGE_MARKER: &str = "/__rd_verify_";

static CHALLENGE_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"fetch\('(/__rd_verify_[^']+)'").unwrap());

/// True when a landing-page response is a challenge page.
pub fn is_challenge(status: u16, body: &str) -> bool {
    status == 403 && body.contains(CHALLENGE_MARKER)
}

/// Callback path embedded in a challenge page.
pub fn challenge_path(body: &str) -> Option<&str> {
    CHALLENGE_PATH
        .captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}
