use std::collections::HashMap;

use axum::extract::Request;
use axum::response::IntoResponse;
use axum::response::Response;
use http::header::CONTENT_TYPE;
use http::HeaderMap;
use http::HeaderName;
use http::HeaderValue;
use http::StatusCode;
use jwt_guard::RequestContext;
use jwt_guard::RequestHeaders;
use jwt_guard::ResponseSink;
use serde_json::Value;

/// Extension type holding verified token payloads, keyed by `token_payload_key`.
#[derive(Debug, Clone, Default)]
pub struct TokenPayloads(HashMap<String, Value>);

impl TokenPayloads {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl ToString, payload: Value) {
        self.0.insert(key.to_string(), payload);
    }
}

/// Exposes an axum request to the auth flows.
pub struct RequestAdapter<'a> {
    request: &'a mut Request,
}

impl<'a> RequestAdapter<'a> {
    pub fn new(request: &'a mut Request) -> Self {
        Self { request }
    }
}

impl RequestHeaders for RequestAdapter<'_> {
    fn header(&self, name: &str) -> Option<&str> {
        self.request
            .headers()
            .get(name)
            .and_then(|value| value.to_str().ok())
    }
}

impl RequestContext for RequestAdapter<'_> {
    fn attach(&mut self, key: &str, payload: Value) {
        let extensions = self.request.extensions_mut();
        match extensions.get_mut::<TokenPayloads>() {
            Some(payloads) => payloads.insert(key, payload),
            None => {
                let mut payloads = TokenPayloads::default();
                payloads.insert(key, payload);
                extensions.insert(payloads);
            }
        }
    }
}

/// Collects what the auth flows write, to become (or decorate) an axum response.
#[derive(Debug, Default)]
pub struct ResponseAdapter {
    status: Option<StatusCode>,
    headers: HeaderMap,
    body: Option<(String, String)>,
}

impl ResponseAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy collected headers onto a downstream response.
    pub fn apply_headers(&self, headers: &mut HeaderMap) {
        for (name, value) in &self.headers {
            headers.insert(name.clone(), value.clone());
        }
    }
}

impl ResponseSink for ResponseAdapter {
    fn set_status(&mut self, status: u16) {
        match StatusCode::from_u16(status) {
            Ok(status) => self.status = Some(status),
            Err(_) => {
                tracing::warn!(status, "Ignoring invalid status code");
            }
        }
    }

    fn set_header(&mut self, name: &str, value: &str) {
        match (
            HeaderName::try_from(name),
            HeaderValue::try_from(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            _ => tracing::warn!(header = name, "Ignoring invalid response header"),
        }
    }

    fn send(&mut self, content_type: &str, body: String) {
        self.body = Some((content_type.to_string(), body));
    }
}

impl IntoResponse for ResponseAdapter {
    fn into_response(self) -> Response {
        let status = self.status.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let mut response = match self.body {
            Some((content_type, body)) => {
                let mut response = (status, body).into_response();
                if let Ok(value) = HeaderValue::from_str(&content_type) {
                    response.headers_mut().insert(CONTENT_TYPE, value);
                }
                response
            }
            None => status.into_response(),
        };

        response.headers_mut().extend(self.headers);
        response
    }
}
