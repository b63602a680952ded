//! Session domain.
//!
//! - [`credentials::Credentials`] / [`credentials::AccessToken`]: what a session holds
//! - [`result::StructuredResult`]: the normalized answer for one prompt
//! - [`quality::check_quality`]: caller-side rejection of useless answers

pub mod credentials;
pub mod quality;
pub mod result;
