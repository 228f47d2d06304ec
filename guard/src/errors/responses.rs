use std::collections::HashMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::json;
use serde_json::Map;
use serde_json::Value;

use super::fault::FaultCode;

/// One localized response: HTTP status plus a message template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseEntry {
    pub http_code: u16,
    pub message: String,
}

impl ResponseEntry {
    pub fn new(http_code: u16, message: impl ToString) -> Self {
        Self {
            http_code,
            message: message.to_string(),
        }
    }
}

/// Resolved response for a fault code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDescriptor {
    pub code: FaultCode,
    pub http_status: u16,
    pub message_template: String,
}

/// Localized response table keyed by fault code string.
///
/// Unknown keys are kept so hosts may ship a table that is a superset of the
/// codes this crate raises.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseTable(HashMap<String, ResponseEntry>);

impl ResponseTable {
    /// Built-in English table.
    pub fn english() -> Self {
        let entries = [
            (
                FaultCode::UnknownError,
                ResponseEntry::new(500, "Unknown error, please try again later."),
            ),
            (
                FaultCode::MissingToken,
                ResponseEntry::new(400, "Missing token param."),
            ),
            (
                FaultCode::InvalidTokenSchema,
                ResponseEntry::new(400, "Token schema is not allowed."),
            ),
            (FaultCode::InvalidToken, ResponseEntry::new(401, "Invalid token.")),
            (
                FaultCode::CorruptedToken,
                ResponseEntry::new(400, "Corrupted token."),
            ),
            (FaultCode::TokenExpired, ResponseEntry::new(401, "Token expired.")),
            (
                FaultCode::TokenBlacklisted,
                ResponseEntry::new(401, "Token in blacklist."),
            ),
        ];

        Self(
            entries
                .into_iter()
                .map(|(code, entry)| (code.as_str().to_string(), entry))
                .collect(),
        )
    }

    pub fn get(&self, code: FaultCode) -> Option<&ResponseEntry> {
        self.0.get(code.as_str())
    }

    pub fn insert(&mut self, code: FaultCode, entry: ResponseEntry) {
        self.0.insert(code.as_str().to_string(), entry);
    }

    /// Resolve `code`, falling back to `UNKNOWN_ERROR` and then to a built-in 500.
    pub fn describe(&self, code: FaultCode) -> ErrorDescriptor {
        let (code, entry) = match self.get(code) {
            Some(entry) => (code, entry.clone()),
            None => (
                FaultCode::UnknownError,
                self.get(FaultCode::UnknownError)
                    .cloned()
                    .unwrap_or_else(|| {
                        ResponseEntry::new(500, "Unknown error, please try again later.")
                    }),
            ),
        };

        ErrorDescriptor {
            code,
            http_status: entry.http_code,
            message_template: entry.message,
        }
    }

    /// Configuration-tree form of the table.
    pub fn to_value(&self) -> Value {
        let map: Map<String, Value> = self
            .0
            .iter()
            .map(|(code, entry)| {
                (
                    code.clone(),
                    json!({ "http_code": entry.http_code, "message": entry.message }),
                )
            })
            .collect();
        Value::Object(map)
    }
}

impl Default for ResponseTable {
    fn default() -> Self {
        Self::english()
    }
}
