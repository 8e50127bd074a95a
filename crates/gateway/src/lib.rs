//! HTTP gateway for ThreadSage.
//!
//! Exposes the Slack Events API endpoint, a health check, and a JSON
//! endpoint for callers that are not Slack.
//!
//! Built on Axum for high performance async HTTP.

pub mod dispatch;

#[cfg(test)]
pub(crate) mod test_support;

use axum::body::Bytes;
use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use threadsage_agent::Pipeline;
use threadsage_channels::{ChallengeResponse, EventEnvelope, SlackChannel, SlackConfig};
use threadsage_core::channel::Channel;
use threadsage_core::message::HistoryEntry;
use tracing::{debug, error, info, warn};

pub use dispatch::{Reactions, handle_message, run_dispatch};

/// Shared application state for the gateway.
pub struct GatewayState {
    pub pipeline: Arc<Pipeline>,
    /// Present when a Slack bot token is configured.
    pub slack: Option<Arc<SlackChannel>>,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/slack", get(slack_ping_handler))
        .route("/slack/events", post(slack_events_handler))
        .route("/v1/respond", post(respond_handler))
        .layer(DefaultBodyLimit::max(1024 * 1024)) // 1 MB body limit
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the gateway HTTP server and, when Slack is configured, the
/// dispatch loop that answers Slack events.
pub async fn start(config: threadsage_config::AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let host = config.gateway.host.clone();
    let port = config.gateway.port;
    let addr = format!("{host}:{port}");

    let providers = threadsage_providers::build_from_config(&config)?;
    let store = Arc::new(threadsage_knowledge::FileKnowledgeStore::new(
        config.knowledge_path(),
    ));
    let pipeline = Arc::new(Pipeline::from_config(&config, &providers, store));

    let slack = if config.slack.is_configured() {
        let channel = Arc::new(SlackChannel::new(SlackConfig::from_app_config(&config.slack)));
        let rx = channel.start().await?;
        tokio::spawn(run_dispatch(
            channel.clone(),
            rx,
            pipeline.clone(),
            Reactions::from_config(&config.slack),
        ));
        Some(channel)
    } else {
        warn!("Slack bot token not set; /slack/events will only answer URL verification");
        None
    };

    let state = Arc::new(GatewayState {
        pipeline,
        slack,
        started_at: chrono::Utc::now(),
    });

    let app = build_router(state.clone());

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            info!("Shutdown signal received");
        })
        .await?;

    shutdown(&state).await;
    info!("Gateway stopped");
    Ok(())
}

/// Close the Slack inbound queue so the dispatch loop drains and exits.
pub async fn shutdown(state: &GatewayState) {
    if let Some(slack) = &state.slack {
        if let Err(e) = slack.stop().await {
            error!(error = %e, "Failed to stop Slack channel");
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    slack: bool,
    uptime_secs: i64,
}

async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        slack: state.slack.is_some(),
        uptime_secs: (chrono::Utc::now() - state.started_at).num_seconds(),
    })
}

async fn slack_ping_handler() -> &'static str {
    "OK"
}

/// Slack Events API endpoint.
///
/// Event callbacks are acknowledged immediately; the answer is produced by
/// the dispatch loop and posted through the Web API.
async fn slack_events_handler(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Some(slack) = &state.slack {
        let timestamp = header_str(&headers, "X-Slack-Request-Timestamp");
        let signature = header_str(&headers, "X-Slack-Signature");
        if let Err(e) = slack.verify_request(timestamp, signature, &body) {
            warn!(error = %e, "Rejected Slack request");
            return StatusCode::UNAUTHORIZED.into_response();
        }
    }

    let envelope = match EventEnvelope::parse(&body) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!(error = %e, "Malformed Slack payload");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    match envelope {
        EventEnvelope::UrlVerification { challenge } => {
            info!("Slack URL verification");
            Json(ChallengeResponse { challenge }).into_response()
        }
        EventEnvelope::EventCallback { event_id, event } => {
            // Slack redelivers events it thinks timed out; the first delivery
            // is already being answered.
            if let Some(retry) = header_str(&headers, "X-Slack-Retry-Num") {
                debug!(event_id = ?event_id, retry = %retry, "Ignoring Slack retry");
                return StatusCode::OK.into_response();
            }

            let Some(slack) = &state.slack else {
                warn!(event_id = ?event_id, "Slack event received but Slack is not configured");
                return StatusCode::OK.into_response();
            };

            match slack.interpret(&event) {
                Some(msg) => {
                    info!(event_id = ?event_id, kind = %event.kind, "Slack event accepted");
                    if let Err(e) = slack.inject_message(msg).await {
                        error!(error = %e, "Failed to queue Slack event");
                    }
                }
                None => debug!(event_id = ?event_id, kind = %event.kind, "Slack event ignored"),
            }
            StatusCode::OK.into_response()
        }
        EventEnvelope::Unsupported => StatusCode::OK.into_response(),
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

#[derive(Deserialize)]
struct RespondRequest {
    message: String,
    #[serde(default)]
    history: Vec<HistoryEntry>,
}

#[derive(Serialize)]
struct RespondResponse {
    response: String,
}

async fn respond_handler(
    State(state): State<SharedState>,
    Json(payload): Json<RespondRequest>,
) -> Json<RespondResponse> {
    let request_id = uuid::Uuid::new_v4();
    info!(
        request_id = %request_id,
        message_len = payload.message.len(),
        history = payload.history.len(),
        "Respond request received"
    );

    let response = state
        .pipeline
        .respond(&payload.message, &payload.history)
        .await;

    Json(RespondResponse { response })
}
