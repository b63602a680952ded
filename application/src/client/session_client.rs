//! Session client: one identity, one session, one prompt at a time.
//!
//! Lifecycle:
//!
//! ```text
//! (no session) ──ensure_session──▶ cookies + token ──send_prompt──▶ ...
//!        ▲                                 │
//!        └──────── reset_session ◀─────────┘ (exhausted / auth failure)
//! ```
//!
//! Credentials live behind a `tokio::sync::Mutex`, so concurrent
//! `ensure_session` calls on the same client are serialized.

use super::credential_acquirer::CredentialAcquirer;
use super::error::{ClientError, Result};
use crate::ports::transport::{HttpRequest, HttpTransport};
use abra_domain::protocol::graphql::{
    BASE_URL, GRAPH_URL, SEARCH_SOURCES, SEND_MESSAGE, send_message_variables,
    source_query_variables,
};
use abra_domain::util::preview;
use abra_domain::{
    AccessToken, CredentialExtractor, Credentials, ExhaustionPolicy, SourceReference,
    StructuredResult, generate_offline_threading_id, parse_response, parse_source_query,
    user_agent_for,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

#[derive(Default)]
struct SessionState {
    credentials: Option<Credentials>,
    token: Option<AccessToken>,
}

/// Owns one credential acquirer plus the send/parse/retry cycle.
pub struct SessionClient {
    id: Option<usize>,
    transport: Arc<dyn HttpTransport>,
    acquirer: CredentialAcquirer,
    exhaustion: ExhaustionPolicy,
    state: Mutex<SessionState>,
}

impl SessionClient {
    /// Create a client whose identity is derived from `client_id`.
    pub fn new(transport: Arc<dyn HttpTransport>, client_id: Option<usize>) -> Self {
        let acquirer = CredentialAcquirer::new(transport.clone(), user_agent_for(client_id), client_id);
        Self {
            id: client_id,
            transport,
            acquirer,
            exhaustion: ExhaustionPolicy::default(),
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn with_exhaustion_policy(mut self, policy: ExhaustionPolicy) -> Self {
        self.exhaustion = policy;
        self
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn CredentialExtractor>) -> Self {
        self.acquirer = self.acquirer.with_extractor(extractor);
        self
    }

    pub fn id(&self) -> Option<usize> {
        self.id
    }

    pub fn user_agent(&self) -> &'static str {
        self.acquirer.user_agent()
    }

    /// Whether both cookies and token are currently held.
    pub async fn has_session(&self) -> bool {
        let state = self.state.lock().await;
        state.credentials.is_some() && state.token.is_some()
    }

    /// Make sure cookies and token are present.
    ///
    /// On failure the session is cleared and acquisition is retried exactly
    /// once before the error surfaces.
    pub async fn ensure_session(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.credentials.is_some() && state.token.is_some() {
            return Ok(());
        }

        if let Err(e) = self.acquire_into(&mut state).await {
            warn!(client = ?self.id, "Session setup failed, retrying: {}", e);
            *state = SessionState::default();
            self.acquire_into(&mut state).await?;
        }
        Ok(())
    }

    async fn acquire_into(&self, state: &mut SessionState) -> Result<()> {
        if state.credentials.is_none() {
            state.credentials = Some(self.acquirer.acquire_cookies().await?);
        }
        if state.token.is_none()
            && let Some(credentials) = &state.credentials
        {
            state.token = Some(self.acquirer.acquire_token(credentials).await?);
        }
        Ok(())
    }

    /// Drop cookies and token. The transport stays open.
    pub async fn reset_session(&self) {
        *self.state.lock().await = SessionState::default();
    }

    /// Release the transport.
    pub async fn close(&self) -> Result<()> {
        self.transport.close().await?;
        Ok(())
    }

    /// Send one prompt and return the structured answer.
    ///
    /// An exhausted session is reset and the prompt re-sent once. Source
    /// lookup is best effort and never fails the request.
    pub async fn send_prompt(&self, prompt: &str) -> Result<StructuredResult> {
        self.ensure_session().await?;

        let mut body = self.fire_message(prompt).await?;
        if self.exhaustion.is_exhausted(&body) {
            info!(client = ?self.id, "Session exhausted, refreshing token and retrying");
            self.reset_session().await;
            self.ensure_session().await?;
            body = self.fire_message(prompt).await?;

            if self.exhaustion.is_exhausted(&body) {
                return Err(ClientError::SessionExhausted);
            }
        }

        debug!(
            client = ?self.id,
            "Raw response: {} bytes, lines: {}",
            body.len(),
            body.lines().filter(|l| !l.trim().is_empty()).count()
        );

        let mut parsed = parse_response(&body);
        if parsed.text.is_empty() {
            warn!(
                client = ?self.id,
                "Empty parsed text. Raw preview: {}",
                preview(&body, 1000)
            );
        }

        if let Some(handle) = parsed.continuation_handle.clone() {
            match self.fetch_sources(&handle).await {
                Ok(sources) if !sources.is_empty() => parsed.sources = sources,
                Ok(_) => {}
                Err(e) => warn!(client = ?self.id, "{}", e),
            }
        }

        Ok(StructuredResult::build(&parsed.text, &parsed.sources))
    }

    async fn current_token(&self) -> Result<AccessToken> {
        self.state.lock().await.token.clone().ok_or_else(|| {
            ClientError::TokenAcquisitionFailed("session has no access token".to_string())
        })
    }

    fn graph_request(&self, token: &AccessToken) -> HttpRequest {
        HttpRequest::post(GRAPH_URL)
            .header("User-Agent", self.user_agent())
            .header("Accept", "*/*")
            .header("Accept-Language", "en-US,en;q=0.9")
            .header("Origin", BASE_URL)
            .header("Referer", format!("{}/", BASE_URL))
            .header("Sec-Fetch-Dest", "empty")
            .header("Sec-Fetch-Mode", "cors")
            .header("Sec-Fetch-Site", "same-site")
            .header("Authorization", token.authorization())
    }

    /// Fire a single send-message call and return the raw body.
    async fn fire_message(&self, prompt: &str) -> Result<String> {
        let token = self.current_token().await?;
        let conversation_id = uuid::Uuid::new_v4().to_string();
        let threading_id = generate_offline_threading_id();
        let variables = send_message_variables(prompt, &conversation_id, &threading_id);

        let request = self
            .graph_request(&token)
            .form_field("fb_api_caller_class", "RelayModern")
            .form_field("fb_api_req_friendly_name", SEND_MESSAGE.friendly_name)
            .form_field("variables", serde_json::to_string(&variables)?)
            .form_field("server_timestamps", "true")
            .form_field("doc_id", SEND_MESSAGE.doc_id);

        let response = self.transport.execute(request).await?;
        if !response.is_ok() {
            return Err(ClientError::MessageSendFailed {
                status: response.status,
                body: preview(&response.body, 500).to_string(),
            });
        }
        Ok(response.body)
    }

    /// Query the structured sources behind a finished answer.
    async fn fetch_sources(&self, handle: &str) -> Result<Vec<SourceReference>> {
        let token = self
            .current_token()
            .await
            .map_err(|e| ClientError::SourceFetchFailed(e.to_string()))?;

        let request = self
            .graph_request(&token)
            .form_field("access_token", token.as_str())
            .form_field("fb_api_caller_class", "RelayModern")
            .form_field("fb_api_req_friendly_name", SEARCH_SOURCES.friendly_name)
            .form_field("variables", source_query_variables(handle).to_string())
            .form_field("server_timestamps", "true")
            .form_field("doc_id", SEARCH_SOURCES.doc_id);

        let response = self
            .transport
            .execute(request)
            .await
            .map_err(|e| ClientError::SourceFetchFailed(e.to_string()))?;
        if !response.is_ok() {
            return Err(ClientError::SourceFetchFailed(format!(
                "HTTP {}",
                response.status
            )));
        }

        Ok(parse_source_query(&response.body))
    }
}
