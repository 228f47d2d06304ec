use std::collections::BTreeMap;

use serde_json::json;

use super::auth::AuthError;
use super::fault::DomainFault;
use super::fault::FaultCode;
use super::responses::ErrorDescriptor;
use super::responses::ResponseTable;
use crate::host::Continuation;
use crate::host::RequestHeaders;
use crate::host::ResponseSink;
use crate::jwt::CodecError;

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_TEXT: &str = "text/plain; charset=utf-8";

/// Body format picked from the request's `Accept` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Json,
    PlainText,
}

impl ResponseFormat {
    pub fn negotiate(accept: Option<&str>) -> Self {
        match accept {
            Some(accept) if accept.to_ascii_lowercase().contains(CONTENT_TYPE_JSON) => {
                ResponseFormat::Json
            }
            _ => ResponseFormat::PlainText,
        }
    }
}

/// Fully rendered error response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

/// Maps faults to localized responses.
#[derive(Debug, Clone)]
pub struct ErrorTranslator {
    responses: ResponseTable,
}

impl ErrorTranslator {
    pub fn new(responses: ResponseTable) -> Self {
        Self { responses }
    }

    /// Convert `error` into a domain fault when it is recognizable.
    ///
    /// # Returns
    /// `None` for faults that must go to the host's failure handling untouched
    pub fn translate(&self, error: &AuthError) -> Option<DomainFault> {
        match error {
            AuthError::Fault(fault) => Some(fault.clone()),
            AuthError::Codec(err) => {
                let code = codec_fault_code(err)?;
                let fault = extract_context(&err.to_string())
                    .into_iter()
                    .fold(DomainFault::new(code), |fault, (key, value)| {
                        fault.with_context(key, value)
                    });
                Some(fault)
            }
            AuthError::Blacklist(_) | AuthError::Config(_) | AuthError::Host(_) => None,
        }
    }

    pub fn describe(&self, code: FaultCode) -> ErrorDescriptor {
        self.responses.describe(code)
    }

    /// Render `fault` in the requested format with placeholders filled in.
    pub fn render(&self, fault: &DomainFault, format: ResponseFormat) -> RenderedResponse {
        let descriptor = self.describe(fault.code());
        let message = substitute(&descriptor.message_template, fault.context());

        match format {
            ResponseFormat::Json => RenderedResponse {
                status: descriptor.http_status,
                content_type: CONTENT_TYPE_JSON,
                body: json!({ "message": message }).to_string(),
            },
            ResponseFormat::PlainText => RenderedResponse {
                status: descriptor.http_status,
                content_type: CONTENT_TYPE_TEXT,
                body: message,
            },
        }
    }

    /// Write the response for `error` to `response`, or forward it.
    ///
    /// # Returns
    /// `Responded` when a translated response was written, `Forward` with the
    /// untouched error otherwise
    pub fn respond<Req, Res>(&self, error: AuthError, request: &Req, response: &mut Res) -> Continuation
    where
        Req: RequestHeaders + ?Sized,
        Res: ResponseSink + ?Sized,
    {
        let Some(fault) = self.translate(&error) else {
            return Continuation::Forward(error);
        };

        let format = ResponseFormat::negotiate(request.header("accept"));
        let rendered = self.render(&fault, format);

        tracing::warn!(
            code = %fault.code(),
            status = rendered.status,
            "Request rejected"
        );

        response.set_status(rendered.status);
        response.send(rendered.content_type, rendered.body);

        Continuation::Responded
    }
}

impl Default for ErrorTranslator {
    fn default() -> Self {
        Self::new(ResponseTable::english())
    }
}

fn codec_fault_code(err: &CodecError) -> Option<FaultCode> {
    match err {
        CodecError::Expired => Some(FaultCode::TokenExpired),
        CodecError::InvalidSignature
        | CodecError::Malformed(_)
        | CodecError::NotYetValid
        | CodecError::ClaimMismatch { .. } => Some(FaultCode::InvalidToken),
        CodecError::Decryption(_) => Some(FaultCode::CorruptedToken),
        CodecError::Encryption(_) | CodecError::Encoding(_) | CodecError::Key(_) => None,
    }
}

/// Pull `key: value` detail out of a `summary. key: value` fault message.
pub fn extract_context(message: &str) -> BTreeMap<String, String> {
    let mut context = BTreeMap::new();

    let mut sentences = message.split('.');
    sentences.next();
    if let Some(detail) = sentences.next() {
        let parts: Vec<&str> = detail.split(':').collect();
        if let [key, value] = parts.as_slice() {
            let key = key.trim().to_lowercase();
            if !key.is_empty() {
                context.insert(key, value.trim().to_string());
            }
        }
    }

    context
}

fn substitute(template: &str, context: &BTreeMap<String, String>) -> String {
    if !template.contains("${") {
        return template.to_string();
    }

    context
        .iter()
        .fold(template.to_string(), |message, (key, value)| {
            message.replace(&format!("${{{}}}", key), value)
        })
}
