use std::sync::Arc;

use axum::extract::Request;
use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;
use jwt_guard::AuthController;
use jwt_guard::AuthError;
use jwt_guard::Continuation;
use jwt_guard::Flow;

use crate::exchange::RequestAdapter;
use crate::exchange::ResponseAdapter;

/// Turns a fault the controller could not translate into a response.
pub type FailureHandler = Arc<dyn Fn(AuthError) -> Response + Send + Sync>;

/// State shared by the auth middleware functions.
#[derive(Clone)]
pub struct GuardState {
    pub controller: Arc<AuthController>,
    on_failure: FailureHandler,
}

impl GuardState {
    pub fn new(controller: Arc<AuthController>) -> Self {
        Self {
            controller,
            on_failure: Arc::new(internal_error),
        }
    }

    /// Replace the default handler (log, then bare 500) for forwarded faults.
    pub fn with_failure_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(AuthError) -> Response + Send + Sync + 'static,
    {
        self.on_failure = Arc::new(handler);
        self
    }
}

/// Middleware that validates the access token and attaches its payload
pub async fn authenticate(
    State(state): State<GuardState>,
    req: Request,
    next: Next,
) -> Result<Response, Response> {
    run(&state, Flow::Authenticate, req, next).await
}

/// Middleware that authenticates, rotating an expired access token
///
/// The new access token is returned on the configured refresh response header.
pub async fn refresh(
    State(state): State<GuardState>,
    req: Request,
    next: Next,
) -> Result<Response, Response> {
    run(&state, Flow::Refresh, req, next).await
}

/// Middleware that authenticates and revokes the access token
pub async fn sign_out(
    State(state): State<GuardState>,
    req: Request,
    next: Next,
) -> Result<Response, Response> {
    run(&state, Flow::SignOut, req, next).await
}

async fn run(
    state: &GuardState,
    flow: Flow,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    let mut sink = ResponseAdapter::new();

    let continuation = {
        let mut adapter = RequestAdapter::new(&mut req);
        state.controller.handle(flow, &mut adapter, &mut sink)
    };

    match continuation {
        Continuation::Next => {
            let mut response = next.run(req).await;
            sink.apply_headers(response.headers_mut());
            Ok(response)
        }
        Continuation::Responded => Err(sink.into_response()),
        Continuation::Forward(err) => Err((state.on_failure)(err)),
    }
}

fn internal_error(err: AuthError) -> Response {
    tracing::error!(error = %err, "Authentication failed with an untranslated error");
    StatusCode::INTERNAL_SERVER_ERROR.into_response()
}
