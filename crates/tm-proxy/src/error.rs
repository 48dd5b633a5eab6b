//! Errors that end a proxied request.
//!
//! Only these cross the rewrite boundary; malformed links and broken markup
//! are absorbed by the rewriters.

use hyper::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("Error building target URI: {0}")]
    InvalidTarget(String),

    #[error("Error forwarding request: {0}")]
    Upstream(String),

    #[error("Interrupted: {0}")]
    Interrupted(String),

    #[error("Error reading upstream response: {0}")]
    BodyRead(String),
}

impl ProxyError {
    /// Status reported to the client. Every variant is fatal for the request.
    pub fn status(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}
