//! Credential extraction from the landing page.
//!
//! The page embeds its tokens inside a serialized script payload. Rather than
//! parsing HTML or JSON, values are cut out between literal delimiter pairs.
//! This is tightly coupled to the page's exact serialization, so the strategy
//! sits behind [`CredentialExtractor`] and can be replaced on its own.

use crate::core::error::DomainError;
use crate::session::credentials::Credentials;

/// Return the text between the first `start` and the next `end` after it.
///
/// Returns `""` when either delimiter is missing. Never panics.
pub fn extract_value<'a>(text: &'a str, start: &str, end: &str) -> &'a str {
    let Some(start_idx) = text.find(start) else {
        return "";
    };
    let value_start = start_idx + start.len();
    match text[value_start..].find(end) {
        Some(len) => &text[value_start..value_start + len],
        None => "",
    }
}

/// Strategy for turning a landing page body into [`Credentials`].
pub trait CredentialExtractor: Send + Sync {
    /// Extract credentials, failing when the session token is absent.
    fn extract(&self, html: &str) -> Result<Credentials, DomainError>;
}

/// A literal `(start, end)` delimiter pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delimiters {
    pub start: &'static str,
    pub end: &'static str,
}

impl Delimiters {
    pub const fn new(start: &'static str, end: &'static str) -> Self {
        Self { start, end }
    }

    pub fn extract<'a>(&self, text: &'a str) -> &'a str {
        extract_value(text, self.start, self.end)
    }
}

/// Default extractor using the landing page's current delimiters.
#[derive(Debug, Clone)]
pub struct DelimiterExtractor {
    pub js_datr: Delimiters,
    pub abra_csrf: Delimiters,
    pub datr: Delimiters,
    pub lsd: Delimiters,
    pub fb_dtsg: Delimiters,
}

impl Default for DelimiterExtractor {
    fn default() -> Self {
        Self {
            js_datr: Delimiters::new("_js_datr\":{\"value\":\"", "\","),
            abra_csrf: Delimiters::new("abra_csrf\":{\"value\":\"", "\","),
            datr: Delimiters::new("datr\":{\"value\":\"", "\","),
            lsd: Delimiters::new("\"LSD\",[],{\"token\":\"", "\"}"),
            fb_dtsg: Delimiters::new("\"DTSGInitData\",[],{\"token\":\"", "\""),
        }
    }
}

impl CredentialExtractor for DelimiterExtractor {
    fn extract(&self, html: &str) -> Result<Credentials, DomainError> {
        let lsd = self.lsd.extract(html);
        if lsd.is_empty() {
            return Err(DomainError::MissingLsdToken);
        }

        let fb_dtsg = self.fb_dtsg.extract(html);

        Ok(Credentials {
            js_datr: self.js_datr.extract(html).to_string(),
            abra_csrf: self.abra_csrf.extract(html).to_string(),
            datr: self.datr.extract(html).to_string(),
            lsd: lsd.to_string(),
            fb_dtsg: (!fb_dtsg.is_empty()).then(|| fb_dtsg.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = concat!(
        r#"<script>{"_js_datr":{"value":"JSDATR1","expire_time":0},"#,
        r#""abra_csrf":{"value":"CSRF2","expire_time":0},"#,
        r#"["LSD",[],{"token":"LSD3"}],"#,
        r#"["DTSGInitData",[],{"token":"DTSG4","async_get_token":""}]</script>"#
    );

    #[test]
    fn extract_value_between_delimiters() {
        let html = r#""LSD",[],{"token":"abc123"}"#;
        assert_eq!(extract_value(html, r#""LSD",[],{"token":""#, r#""}"#), "abc123");

        let html = r#""datr":{"value":"xyz789","expire_time":0}"#;
        assert_eq!(extract_value(html, r#""datr":{"value":""#, "\","), "xyz789");
    }

    #[test]
    fn extract_value_missing_start() {
        assert_eq!(extract_value("nothing here", "start", "end"), "");
    }

    #[test]
    fn extract_value_missing_end() {
        assert_eq!(extract_value("start_but_no_end", "start_", "missing"), "");
    }

    #[test]
    fn extract_value_empty_inputs() {
        assert_eq!(extract_value("", "a", "b"), "");
        assert_eq!(extract_value("ab", "a", "b"), "");
    }

    #[test]
    fn extract_value_multibyte_text() {
        assert_eq!(extract_value("前[値]後", "[", "]"), "値");
    }

    #[test]
    fn delimiter_extractor_reads_all_fields() {
        let creds = DelimiterExtractor::default().extract(PAGE).unwrap();
        assert_eq!(creds.js_datr, "JSDATR1");
        assert_eq!(creds.abra_csrf, "CSRF2");
        assert_eq!(creds.lsd, "LSD3");
        assert_eq!(creds.fb_dtsg.as_deref(), Some("DTSG4"));
    }

    #[test]
    fn datr_delimiter_matches_inside_js_datr() {
        // The datr delimiter is a suffix of the _js_datr one, so the first hit
        // wins when the page has no standalone datr cookie.
        let creds = DelimiterExtractor::default().extract(PAGE).unwrap();
        assert_eq!(creds.datr, "JSDATR1");
    }

    #[test]
    fn missing_lsd_is_hard_failure() {
        let page = r#"{"datr":{"value":"D","expire_time":0}}"#;
        assert_eq!(
            DelimiterExtractor::default().extract(page),
            Err(DomainError::MissingLsdToken)
        );
    }

    #[test]
    fn missing_dtsg_is_optional() {
        let page = r#"["LSD",[],{"token":"only-lsd"}]"#;
        let creds = DelimiterExtractor::default().extract(page).unwrap();
        assert_eq!(creds.lsd, "only-lsd");
        assert!(creds.fb_dtsg.is_none());
        assert_eq!(creds.datr, "");
    }
}
