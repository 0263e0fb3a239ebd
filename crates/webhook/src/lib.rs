//! Minimal webhook listener for feeding a core over HTTP.
//!
//! The routing core does not own transports; an interface whose platform
//! pushes events over HTTP can mount this app instead of rolling its own.
//! `POST /hook` accepts one JSON body of any shape, wraps it in an
//! [`InboundEvent`] tagged with the embedding interface's id, and hands it
//! to [`Core::handle`]; the JSON response reports what the router did with
//! it. `GET /health` is a liveness probe. When a token is configured, posts
//! must present it in the [`TOKEN_HEADER`] header.

use std::{net::SocketAddr, sync::Arc};

use {
    axum::{
        Json, Router,
        extract::State,
        http::{HeaderMap, StatusCode},
        response::IntoResponse,
        routing::{get, post},
    },
    secrecy::{ExposeSecret, Secret},
    serde_json::Value,
    tokio_util::sync::CancellationToken,
    tracing::{debug, info, warn},
};

use weir_core::{Core, InboundEvent};

/// Header carrying the shared-secret token when one is configured.
pub const TOKEN_HEADER: &str = "x-weir-token";

/// State behind the webhook app.
#[derive(Clone)]
pub struct WebhookState {
    core: Arc<Core>,
    interface: String,
    token: Option<Secret<String>>,
}

impl WebhookState {
    /// Accepted events are tagged with `interface`, the id of the interface
    /// whose deliveries answer them.
    pub fn new(core: Arc<Core>, interface: impl Into<String>) -> Self {
        Self {
            core,
            interface: interface.into(),
            token: None,
        }
    }

    /// Require every post to present `token` in [`TOKEN_HEADER`].
    #[must_use]
    pub fn with_token(mut self, token: Secret<String>) -> Self {
        self.token = Some(token);
        self
    }
}

/// Build the webhook router. Shared between production startup and tests.
pub fn build_app(state: WebhookState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/hook", post(hook_handler))
        .with_state(state)
}

/// Serve the webhook app on `addr` until `cancel` fires.
pub async fn serve(
    addr: SocketAddr,
    state: WebhookState,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let app = build_app(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "webhook listener started");
    axum::serve(listener, app)
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await?;
    info!("webhook listener stopped");
    Ok(())
}

// ── Handlers ────────────────────────────────────────────────────────────────

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn hook_handler(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> impl IntoResponse {
    if let Some(ref token) = state.token {
        let presented = headers.get(TOKEN_HEADER).and_then(|v| v.to_str().ok());
        if presented != Some(token.expose_secret().as_str()) {
            warn!(interface = %state.interface, "webhook post rejected: bad or missing token");
            return (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({ "ok": false, "error": "invalid token" })),
            );
        }
    }

    let event = InboundEvent::new(state.interface.clone(), payload);
    let event_id = event.id();
    debug!(interface = %state.interface, %event_id, "webhook event accepted");

    let handled = state.core.handle(event).await;
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "ok": true,
            "event": event_id.to_string(),
            "matched": handled.matched,
            "delivered": handled.delivered().len(),
            "detached": handled.detached(),
        })),
    )
}
