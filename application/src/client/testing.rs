//! Scripted transport and canned upstream payloads for tests.

use crate::ports::transport::{HttpRequest, HttpResponse, HttpTransport, TransportError};
use async_trait::async_trait;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Transport that replays a fixed script and records every request.
pub(crate) struct ScriptedTransport {
    script: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    requests: Mutex<Vec<HttpRequest>>,
    closed: AtomicUsize,
}

impl ScriptedTransport {
    pub(crate) fn new(responses: Vec<HttpResponse>) -> Arc<Self> {
        Self::with_results(responses.into_iter().map(Ok).collect())
    }

    pub(crate) fn with_results(results: Vec<Result<HttpResponse, TransportError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(VecDeque::from(results)),
            requests: Mutex::new(Vec::new()),
            closed: AtomicUsize::new(0),
        })
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn remaining(&self) -> usize {
        self.script.lock().unwrap().len()
    }

    pub(crate) fn close_count(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Other("No more responses".to_string())))
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub(crate) fn landing_html(lsd: &str) -> String {
    format!(
        concat!(
            r#"<script>{{"datr":{{"value":"DATR","expiry":1}},"#,
            r#""_js_datr":{{"value":"JSDATR","expiry":1}},"#,
            r#""abra_csrf":{{"value":"CSRF","expiry":1}}}}"#,
            r#"["LSD",[],{{"token":"{}"}}]"#,
            r#"["DTSGInitData",[],{{"token":"DTSG","async_get_token":""}}]</script>"#,
        ),
        lsd
    )
}

pub(crate) fn token_body(token: &str) -> String {
    json!({
        "data": {
            "xab_abra_accept_terms_of_service": {
                "new_temp_user_auth": { "access_token": token }
            }
        }
    })
    .to_string()
}

/// A streamed reply whose final frame carries `text` and an optional handle.
pub(crate) fn message_body(text: &str, fetch_id: Option<&str>) -> String {
    let mut msg = json!({ "composed_text": { "content": [{ "text": text }] } });
    if let Some(id) = fetch_id {
        msg["fetch_id"] = json!(id);
    }
    let frame = json!({ "data": { "node": { "bot_response_message": msg } } });
    // Pad past the exhaustion threshold like a real streamed reply
    let filler = json!({ "extensions": { "padding": "x".repeat(1024) } });
    format!("{}\n{}\n", filler, frame)
}

pub(crate) fn exhausted_body() -> String {
    r#"{"data":{"node":{"bot_response_message":null}}}"#.to_string()
}

pub(crate) fn sources_body(urls: &[&str]) -> String {
    let refs: Vec<_> = urls
        .iter()
        .map(|u| json!({ "url": u, "title": "T", "snippet": "S" }))
        .collect();
    json!({ "data": { "message": { "searchResults": { "references": refs } } } }).to_string()
}

/// A long answer that passes the quality gate without sources.
pub(crate) fn long_answer() -> String {
    "Tesla shipped a new software update with improved autopilot. ".repeat(5)
}
