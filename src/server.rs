//! Webhook server
//!
//! Receives GitHub webhook deliveries and dispatches them to the handlers.
//! Events are handled on spawned tasks so GitHub gets an immediate ack; a
//! failing handler never changes the HTTP response.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};

use crate::event::WebhookEvent;
use crate::handlers::HandlerContext;

pub struct AppState {
    pub ctx: HandlerContext,
    pub started_at: std::time::Instant,
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/webhook", post(webhook_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    healthy: bool,
    uptime_secs: u64,
    version: String,
    bot: String,
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        healthy: true,
        uptime_secs: state.started_at.elapsed().as_secs(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        bot: state.ctx.bot_login.clone(),
    })
}

async fn webhook_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let event_name = match headers.get("X-GitHub-Event").and_then(|v| v.to_str().ok()) {
        Some(name) => name.to_string(),
        None => {
            warn!("Webhook delivery without X-GitHub-Event header");
            return StatusCode::BAD_REQUEST;
        }
    };

    let event = match WebhookEvent::parse(&event_name, &body) {
        Ok(Some(event)) => event,
        Ok(None) => {
            debug!("Ignoring {} delivery", event_name);
            return StatusCode::NO_CONTENT;
        }
        Err(e) => {
            // Acked, not rejected: a redelivery of the same payload would
            // fail the same way
            warn!("Couldn't parse {} payload: {}", event_name, e);
            return StatusCode::NO_CONTENT;
        }
    };

    // Ack immediately; the handler runs to completion on its own task and
    // only reports through logs.
    tokio::spawn(async move {
        state.ctx.dispatch(event).await;
    });

    StatusCode::ACCEPTED
}

/// Run the server
pub async fn run_server(host: &str, port: u16, ctx: HandlerContext) -> anyhow::Result<()> {
    let state = Arc::new(AppState {
        ctx,
        started_at: std::time::Instant::now(),
    });

    let app = create_router(state);
    let addr = format!("{}:{}", host, port);

    info!("Starting bounty-bot webhook server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
