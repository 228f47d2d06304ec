//! Token authentication middleware core
//!
//! Provides the framework-independent pieces of request authentication:
//! - Layered configuration with one-time initialization
//! - JWT signing and verification with an optional AES envelope
//! - Token revocation through pluggable blacklist drivers
//! - Translation of faults into localized HTTP responses
//! - Authenticate, refresh and sign-out flows
//!
//! Web frameworks plug in by implementing the collaborator traits in [`host`].
//!
//! # Examples
//!
//! ## Issue and authenticate
//! ```
//! use std::collections::HashMap;
//!
//! use jwt_guard::AuthController;
//! use jwt_guard::ConfigStore;
//! use serde_json::json;
//!
//! let store = ConfigStore::with_overrides(json!({
//!     "jwt": { "secret": "secret_key_at_least_32_bytes_long!" }
//! }));
//! let controller = AuthController::builder(&store).build().unwrap();
//!
//! let pair = controller.issue(&json!({ "user_id": 42 })).unwrap();
//! let request = HashMap::from([(
//!     "authorization".to_string(),
//!     format!("Bearer {}", pair.access_token),
//! )]);
//!
//! let authenticated = controller.authenticate(&request).unwrap();
//! assert_eq!(authenticated.claims.payload, json!({ "user_id": 42 }));
//! ```
//!
//! ## Revocation
//! ```
//! use std::collections::HashMap;
//!
//! use jwt_guard::AuthController;
//! use jwt_guard::ConfigStore;
//! use jwt_guard::FaultCode;
//! use serde_json::json;
//!
//! let store = ConfigStore::with_overrides(json!({
//!     "jwt": { "secret": "secret_key_at_least_32_bytes_long!", "use_blacklist": true }
//! }));
//! let controller = AuthController::builder(&store).build().unwrap();
//!
//! let pair = controller.issue(&json!({ "user_id": 42 })).unwrap();
//! let request = HashMap::from([(
//!     "authorization".to_string(),
//!     format!("Bearer {}", pair.access_token),
//! )]);
//!
//! controller.sign_out(&request).unwrap();
//! let err = controller.authenticate(&request).unwrap_err();
//! assert_eq!(err.code(), Some(FaultCode::TokenBlacklisted));
//! ```

pub mod blacklist;
pub mod config;
pub mod controller;
pub mod crypter;
pub mod errors;
pub mod extractor;
pub mod host;
pub mod jwt;

// Re-export commonly used items
pub use blacklist::BlacklistDriver;
pub use blacklist::DriverRegistry;
pub use blacklist::MemoryBlacklist;
pub use config::ConfigError;
pub use config::ConfigStore;
pub use config::Settings;
pub use controller::AuthController;
pub use controller::AuthControllerBuilder;
pub use controller::Authenticated;
pub use controller::Flow;
pub use controller::Refreshed;
pub use controller::TokenPair;
pub use crypter::Envelope;
pub use crypter::EnvelopeAlgorithm;
pub use errors::AuthError;
pub use errors::DomainFault;
pub use errors::ErrorTranslator;
pub use errors::FaultCode;
pub use errors::ResponseTable;
pub use extractor::HeaderExtractor;
pub use extractor::TokenExtractor;
pub use host::Continuation;
pub use host::RequestContext;
pub use host::RequestHeaders;
pub use host::ResponseSink;
pub use jwt::Claims;
pub use jwt::CodecError;
pub use jwt::TokenCodec;
pub use jwt::TokenOptions;
