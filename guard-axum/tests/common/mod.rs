use std::sync::Arc;
use std::sync::Once;

use axum::body::to_bytes;
use axum::body::Body;
use axum::http::Request;
use axum::http::StatusCode;
use axum::middleware;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use axum::Extension;
use axum::Json;
use axum::Router;
use jwt_guard::AuthController;
use jwt_guard::AuthControllerBuilder;
use jwt_guard::ConfigStore;
use jwt_guard_axum::authenticate;
use jwt_guard_axum::refresh;
use jwt_guard_axum::sign_out;
use jwt_guard_axum::GuardState;
use jwt_guard_axum::TokenPayloads;
use serde_json::json;
use serde_json::Value;
use tower::ServiceExt;

pub const SECRET: &str = "test-secret-key-for-jwt-signing-at-least-32-bytes";

static TRACING: Once = Once::new();

/// Test application wrapping a router guarded by every middleware flow
pub struct TestApp {
    pub router: Router,
    pub controller: Arc<AuthController>,
}

impl TestApp {
    /// Build the application with blacklisting enabled
    pub fn spawn() -> Self {
        Self::with_config(json!({ "jwt": { "use_blacklist": true } }))
    }

    /// Build the application with `overrides` merged over the test secret
    pub fn with_config(overrides: Value) -> Self {
        Self::build(overrides, |builder| builder, |state| state)
    }

    /// Build the application, customizing the controller builder and the guard state
    pub fn build<B, S>(overrides: Value, customize: B, customize_state: S) -> Self
    where
        B: FnOnce(AuthControllerBuilder<'_>) -> AuthControllerBuilder<'_>,
        S: FnOnce(GuardState) -> GuardState,
    {
        init_tracing();

        let mut config = json!({ "jwt": { "secret": SECRET } });
        jwt_guard::config::store::deep_merge(&mut config, overrides);
        let store = ConfigStore::with_overrides(config);

        let controller = Arc::new(
            customize(AuthController::builder(&store))
                .build()
                .expect("Failed to build controller"),
        );
        let state = customize_state(GuardState::new(Arc::clone(&controller)));

        let payload_key = controller.payload_key().to_string();
        let me = move |Extension(payloads): Extension<TokenPayloads>| {
            let payload = payloads.get(&payload_key).cloned().unwrap_or(Value::Null);
            async move { Json(payload) }
        };

        let protected = Router::new()
            .route("/me", get(me.clone()))
            .route_layer(middleware::from_fn_with_state(state.clone(), authenticate));
        let refreshing = Router::new()
            .route("/refresh", get(me))
            .route_layer(middleware::from_fn_with_state(state.clone(), refresh));
        let signing_out = Router::new()
            .route("/logout", post(logout))
            .route_layer(middleware::from_fn_with_state(state, sign_out));

        let router = Router::new()
            .merge(protected)
            .merge(refreshing)
            .merge(signing_out);

        Self { router, controller }
    }

    /// Send a request through the router
    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to execute request")
    }

    /// GET `path` with `Authorization: Bearer <token>`
    pub async fn get_with_token(&self, path: &str, token: &str) -> Response {
        let request = Request::builder()
            .uri(path)
            .header("authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .expect("Failed to build request");
        self.send(request).await
    }

    /// POST /logout with `Authorization: Bearer <token>`
    pub async fn logout(&self, token: &str) -> Response {
        let request = Request::builder()
            .method("POST")
            .uri("/logout")
            .header("authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .expect("Failed to build request");
        self.send(request).await
    }
}

/// Collect a response body into a string
pub async fn body_string(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    String::from_utf8(bytes.to_vec()).expect("Body is not UTF-8")
}

async fn logout() -> StatusCode {
    StatusCode::NO_CONTENT
}

fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("jwt_guard=debug,jwt_guard_axum=debug")
            .with_test_writer()
            .try_init();
    });
}
