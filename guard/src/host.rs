//! Contracts between the controller and the host's request handling stack.

use std::collections::HashMap;

use serde_json::Value;

use crate::errors::AuthError;

/// Read access to incoming request headers.
pub trait RequestHeaders {
    /// Header value by name. Implementations compare names case-insensitively.
    fn header(&self, name: &str) -> Option<&str>;
}

/// Request that can carry the verified payload to downstream handlers.
pub trait RequestContext: RequestHeaders {
    fn attach(&mut self, key: &str, payload: Value);
}

/// Outgoing response the translator and the refresh flow write to.
pub trait ResponseSink {
    fn set_status(&mut self, status: u16);

    fn set_header(&mut self, name: &str, value: &str);

    fn send(&mut self, content_type: &str, body: String);
}

/// What the host should do after a flow ran.
#[derive(Debug)]
pub enum Continuation {
    /// Flow succeeded; hand the request to the next handler.
    Next,
    /// A translated error response has been written to the sink.
    Responded,
    /// Unrecognized fault for the host's generic failure handling.
    Forward(AuthError),
}

impl Continuation {
    pub fn is_next(&self) -> bool {
        matches!(self, Continuation::Next)
    }
}

impl RequestHeaders for HashMap<String, String> {
    fn header(&self, name: &str) -> Option<&str> {
        self.iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}
