//! Credential acquisition: landing-page cookies, challenge and token.

use super::error::{ClientError, Result};
use crate::ports::transport::{HttpRequest, HttpResponse, HttpTransport};
use abra_domain::protocol::graphql::{
    ACCEPT_TOS, ASBD_ID, BASE_URL, TOKEN_URL, accept_tos_variables,
};
use abra_domain::util::preview;
use abra_domain::{
    AccessToken, CredentialExtractor, Credentials, DelimiterExtractor, challenge_path,
    is_challenge, parse_access_token,
};
use std::sync::Arc;
use tracing::{debug, info};

const LANDING_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";
const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";
const BODY_PREVIEW: usize = 500;

/// Drives the landing page, challenge and token mutation for one identity.
///
/// Holds no session state of its own; the [`SessionClient`](super::SessionClient)
/// decides when to call it and keeps the results.
pub struct CredentialAcquirer {
    transport: Arc<dyn HttpTransport>,
    user_agent: &'static str,
    extractor: Arc<dyn CredentialExtractor>,
    client_id: Option<usize>,
}

impl CredentialAcquirer {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        user_agent: &'static str,
        client_id: Option<usize>,
    ) -> Self {
        Self {
            transport,
            user_agent,
            extractor: Arc::new(DelimiterExtractor::default()),
            client_id,
        }
    }

    /// Swap the landing-page extraction strategy.
    pub fn with_extractor(mut self, extractor: Arc<dyn CredentialExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn user_agent(&self) -> &'static str {
        self.user_agent
    }

    /// Fetch the landing page and scrape the cookie set.
    ///
    /// A bot-detection challenge is solved at most once per call.
    pub async fn acquire_cookies(&self) -> Result<Credentials> {
        info!(client = ?self.client_id, "Fetching cookies from landing page");
        let mut response = self.fetch_landing().await?;
        debug!(
            client = ?self.client_id,
            "Landing page: HTTP {}, {} bytes",
            response.status,
            response.body.len()
        );

        if is_challenge(response.status, &response.body) {
            let path = challenge_path(&response.body)
                .ok_or_else(|| {
                    ClientError::ChallengeUnsolvable(preview(&response.body, BODY_PREVIEW).to_string())
                })?
                .to_string();
            info!(client = ?self.client_id, "Solving bot-detection challenge: {}", path);
            self.solve_challenge(&path).await?;

            response = self.fetch_landing().await?;
            debug!(
                client = ?self.client_id,
                "Post-challenge landing page: HTTP {}, {} bytes",
                response.status,
                response.body.len()
            );
        }

        if !response.is_ok() {
            return Err(ClientError::CookieExtractionFailed(format!(
                "Got HTTP {} from landing page: {}",
                response.status,
                preview(&response.body, BODY_PREVIEW)
            )));
        }

        let credentials = self
            .extractor
            .extract(&response.body)
            .map_err(|e| ClientError::CookieExtractionFailed(e.to_string()))?;
        debug!(client = ?self.client_id, "Extracted cookies: {:?}", credentials);
        Ok(credentials)
    }

    /// Trade the cookie set for a temporary-user access token.
    pub async fn acquire_token(&self, credentials: &Credentials) -> Result<AccessToken> {
        if credentials.lsd.is_empty() {
            return Err(ClientError::TokenAcquisitionFailed(
                "LSD token missing from credentials".to_string(),
            ));
        }

        let request = HttpRequest::post(TOKEN_URL)
            .header("User-Agent", self.user_agent)
            .header("Accept", "*/*")
            .header("Accept-Language", ACCEPT_LANGUAGE)
            .header("Origin", BASE_URL)
            .header("Referer", format!("{}/", BASE_URL))
            .header("Sec-Fetch-Dest", "empty")
            .header("Sec-Fetch-Mode", "cors")
            .header("Sec-Fetch-Site", "same-origin")
            .header("Cookie", credentials.cookie_header())
            .header("X-Fb-Friendly-Name", ACCEPT_TOS.friendly_name)
            .header("X-Fb-Lsd", credentials.lsd.as_str())
            .header("X-Asbd-Id", ASBD_ID)
            .form_field("lsd", credentials.lsd.as_str())
            .form_field("fb_dtsg", credentials.fb_dtsg())
            .form_field("fb_api_caller_class", "RelayModern")
            .form_field("fb_api_req_friendly_name", ACCEPT_TOS.friendly_name)
            .form_field("variables", accept_tos_variables().to_string())
            .form_field("doc_id", ACCEPT_TOS.doc_id);

        let response = self.transport.execute(request).await?;
        if !response.is_ok() {
            return Err(ClientError::TokenAcquisitionFailed(format!(
                "Token request failed: {} {}",
                response.status,
                preview(&response.body, BODY_PREVIEW)
            )));
        }

        let token = parse_access_token(&response.body)
            .map(AccessToken::new)
            .map_err(|e| ClientError::TokenAcquisitionFailed(e.to_string()))?;
        info!(client = ?self.client_id, "Got access token: {:?}", token);
        Ok(token)
    }

    async fn fetch_landing(&self) -> Result<HttpResponse> {
        let request = HttpRequest::get(format!("{}/", BASE_URL))
            .header("User-Agent", self.user_agent)
            .header("Accept", LANDING_ACCEPT)
            .header("Accept-Language", ACCEPT_LANGUAGE)
            .header("Cache-Control", "no-cache")
            .header("Sec-Fetch-Dest", "document")
            .header("Sec-Fetch-Mode", "navigate")
            .header("Sec-Fetch-Site", "none")
            .header("Sec-Fetch-User", "?1")
            .header("Upgrade-Insecure-Requests", "1");
        Ok(self.transport.execute(request).await?)
    }

    async fn solve_challenge(&self, path: &str) -> Result<()> {
        let request = HttpRequest::post(format!("{}{}", BASE_URL, path))
            .header("User-Agent", self.user_agent)
            .header("Accept", "*/*")
            .header("Origin", BASE_URL)
            .header("Referer", format!("{}/", BASE_URL));
        let response = self.transport.execute(request).await?;
        debug!(client = ?self.client_id, "Challenge callback: HTTP {}", response.status);
        Ok(())
    }
}
