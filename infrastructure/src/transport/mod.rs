//! HTTP transport adapters.
//!
//! - [`ReqwestTransport`]: cookie-keeping `reqwest` session implementing
//!   [`HttpTransport`](abra_application::HttpTransport)
//! - [`ReqwestTransportFactory`]: one transport per session client, with
//!   optional proxy session rotation
//! - [`make_session_proxy`]: proxy username rewriting

mod proxy;
mod reqwest_transport;

pub use proxy::{make_session_proxy, redact_proxy};
pub use reqwest_transport::{DEFAULT_REQUEST_TIMEOUT, ReqwestTransport, ReqwestTransportFactory};
