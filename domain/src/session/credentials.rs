//! Session credentials: anti-bot cookies and the temporary access token.

use std::fmt;

/// Abbreviate a secret for diagnostics.
fn redact(value: &str) -> String {
    if value.is_empty() {
        "(empty)".to_string()
    } else {
        format!("{}...", crate::util::preview(value, 10))
    }
}

/// Cookie set and CSRF/session tokens scraped from the landing page.
///
/// Immutable once fetched. A session client drops the whole value on reset
/// rather than patching individual fields.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub js_datr: String,
    pub abra_csrf: String,
    pub datr: String,
    /// Session token; token acquisition is impossible without it.
    pub lsd: String,
    pub fb_dtsg: Option<String>,
}

impl Credentials {
    /// Cookie header sent with the token mutation.
    pub fn cookie_header(&self) -> String {
        [
            format!("_js_datr={}", self.js_datr),
            format!("datr={}", self.datr),
            format!("abra_csrf={}", self.abra_csrf),
            "ps_n=1".to_string(),
            "ps_l=1".to_string(),
            "dpr=2".to_string(),
        ]
        .join("; ")
    }

    /// The DTSG token, or empty when the page did not carry one.
    pub fn fb_dtsg(&self) -> &str {
        self.fb_dtsg.as_deref().unwrap_or("")
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("js_datr", &redact(&self.js_datr))
            .field("abra_csrf", &redact(&self.abra_csrf))
            .field("datr", &redact(&self.datr))
            .field("lsd", &redact(&self.lsd))
            .field("fb_dtsg", &self.fb_dtsg.as_deref().map(redact))
            .finish()
    }
}

/// Opaque bearer token for a temporary user.
///
/// Lifetime is bounded by server-side exhaustion, not by a clock.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header.
    pub fn authorization(&self) -> String {
        format!("OAuth {}", self.0)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccessToken({})", redact(&self.0))
    }
}
