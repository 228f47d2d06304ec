//! axum middleware for jwt-guard
//!
//! Wires [`jwt_guard::AuthController`] flows into `axum::middleware::from_fn_with_state`:
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use axum::middleware;
//! use axum::routing::get;
//! use axum::Router;
//! use jwt_guard::AuthController;
//! use jwt_guard::ConfigStore;
//! use jwt_guard_axum::authenticate;
//! use jwt_guard_axum::GuardState;
//!
//! let store = ConfigStore::with_overrides(ConfigStore::load_overrides().unwrap());
//! let controller = AuthController::builder(&store).build().unwrap();
//! let state = GuardState::new(Arc::new(controller));
//!
//! let app: Router = Router::new()
//!     .route("/me", get(|| async { "ok" }))
//!     .route_layer(middleware::from_fn_with_state(state, authenticate));
//! ```

pub mod exchange;
pub mod middleware;

pub use exchange::TokenPayloads;
pub use middleware::authenticate;
pub use middleware::refresh;
pub use middleware::sign_out;
pub use middleware::FailureHandler;
pub use middleware::GuardState;
