//! Residential proxy session rotation.
//!
//! Rotating providers pick the exit node from the proxy username, so a new
//! session id in the username gives a new IP while the credentials stay the
//! same.

use abra_application::TransportError;
use url::Url;

/// Rewrite the proxy username to `user-<user>-country-<country>-session-<id>`.
///
/// Scheme, password, host, port and path are kept; query and fragment are
/// dropped. The country code is lowercased.
pub fn make_session_proxy(
    base: &str,
    session_id: &str,
    country: &str,
) -> Result<String, TransportError> {
    let mut url = Url::parse(base)
        .map_err(|e| TransportError::InvalidProxy(format!("{}: {}", redact_proxy(base), e)))?;

    if url.username().is_empty() {
        return Err(TransportError::InvalidProxy(format!(
            "{}: no username to rotate",
            redact_proxy(base)
        )));
    }

    let username = format!(
        "user-{}-country-{}-session-{}",
        url.username(),
        country.to_lowercase(),
        session_id
    );
    url.set_username(&username).map_err(|()| {
        TransportError::InvalidProxy(format!("{}: cannot carry credentials", redact_proxy(base)))
    })?;
    url.set_query(None);
    url.set_fragment(None);

    Ok(url.to_string())
}

/// `host:port` of a proxy URL, safe to log.
pub fn redact_proxy(proxy: &str) -> String {
    match Url::parse(proxy) {
        Ok(url) => match (url.host_str(), url.port_or_known_default()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            _ => "<proxy>".to_string(),
        },
        Err(_) => proxy
            .rsplit_once('@')
            .map(|(_, host)| host.to_string())
            .unwrap_or_else(|| "<proxy>".to_string()),
    }
}
