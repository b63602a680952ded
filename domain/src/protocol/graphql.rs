//! Upstream GraphQL operations.
//!
//! Every call is a form-encoded POST naming a persisted query by `doc_id`.
//! Ids, friendly names and variable layouts are fixed by the service.

use crate::core::error::DomainError;
use crate::protocol::parser::json_lines;
use crate::util::preview;
use serde_json::{Value, json};

/// Landing page origin.
pub const BASE_URL: &str = "https://www.meta.ai";

/// Same-origin GraphQL endpoint used for the token mutation.
pub const TOKEN_URL: &str = "https://www.meta.ai/api/graphql/";

/// Cross-site GraphQL endpoint used once authenticated.
pub const GRAPH_URL: &str = "https://graph.meta.ai/graphql?locale=user";

/// A persisted GraphQL operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
    pub friendly_name: &'static str,
    pub doc_id: &'static str,
}

/// Accept the terms of service as a temporary user, yielding a token.
pub const ACCEPT_TOS: Operation = Operation {
    friendly_name: "useAbraAcceptTOSForTempUserMutation",
    doc_id: "7604648749596940",
};

/// Send a chat message.
pub const SEND_MESSAGE: Operation = Operation {
    friendly_name: "useAbraSendMessageMutation",
    doc_id: "7783822248314888",
};

/// Fetch structured source references for a finished answer.
pub const SEARCH_SOURCES: Operation = Operation {
    friendly_name: "AbraSearchPluginDialogQuery",
    doc_id: "6946734308765963",
};

/// Value of the `X-Asbd-Id` header on the token mutation.
pub const ASBD_ID: &str = "129477";

/// Date of birth declared for every temporary user.
pub const TEMP_USER_DOB: &str = "1999-01-01";

pub fn accept_tos_variables() -> Value {
    json!({ "dob": TEMP_USER_DOB, "tos_accepted": true })
}

pub fn send_message_variables(prompt: &str, conversation_id: &str, threading_id: &str) -> Value {
    json!({
        "message": { "sensitive_string_value": prompt },
        "externalConversationId": conversation_id,
        "offlineThreadingId": threading_id,
        "suggestedPromptIndex": null,
        "flashVideoRecapInput": { "images": [] },
        "flashPreviewInput": null,
        "promptPrefix": null,
        "entrypoint": "ABRA__CHAT__TEXT",
        "icebreaker_type": "TEXT",
    })
}

pub fn source_query_variables(continuation_handle: &str) -> Value {
    json!({ "abraMessageFetchID": continuation_handle })
}

const TOKEN_PATH: [&str; 4] = [
    "data",
    "xab_abra_accept_terms_of_service",
    "new_temp_user_auth",
    "access_token",
];

/// Extract the access token from the NDJSON token-mutation reply.
///
/// The first frame carrying a `data` key is used; blank and malformed lines
/// are skipped.
pub fn parse_access_token(body: &str) -> Result<String, DomainError> {
    let frame = json_lines(body)
        .find(|frame| frame.get("data").is_some())
        .ok_or_else(|| DomainError::NoTokenData(preview(body, 500).to_string()))?;

    let mut node = &frame;
    for key in TOKEN_PATH {
        node = match node.get(key) {
            Some(next) if !next.is_null() => next,
            _ => {
                return Err(DomainError::TokenPathMissing {
                    path: key,
                    preview: preview(&frame.to_string(), 500).to_string(),
                });
            }
        };
    }

    node.as_str()
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .ok_or_else(|| DomainError::TokenPathMissing {
            path: "access_token",
            preview: preview(&frame.to_string(), 500).to_string(),
        })
}
