//! Session client and credential acquisition.
//!
//! - [`CredentialAcquirer`]: landing page, challenge and token mutation
//! - [`SessionClient`]: session lifecycle plus the send/parse/retry cycle
//! - [`ClientError`]: everything either of them can raise

pub mod credential_acquirer;
pub mod error;
pub mod session_client;

#[cfg(test)]
pub(crate) mod testing;

pub use credential_acquirer::CredentialAcquirer;
pub use error::ClientError;
pub use session_client::SessionClient;
