//! HTTP surface: router construction, the chat handler, and server startup.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderValue, StatusCode},
    routing::post,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::AppState;
use crate::assistant::{AssistantSettings, Orchestrator};
use crate::config::AppConfig;

/// Start the Axum server with the provided configuration.
pub async fn start_server(
    config: Arc<AppConfig>,
    settings: AssistantSettings,
) -> anyhow::Result<()> {
    info!(
        name: "assistant.config.loaded",
        base_url = %settings.base_url,
        assistant_id = %settings.assistant_id,
        poll_attempts = settings.poll_attempts,
        "assistant configuration loaded"
    );

    let orchestrator = Arc::new(Orchestrator::new(settings));

    let state = AppState {
        orchestrator,
        config: Arc::clone(&config),
    };

    let app = build_router(state)?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

/// Build the application router with its middleware stack.
///
/// No request-timeout layer is applied: a chat request legitimately runs up
/// to the workflow's own polling ceiling, which is the only time bound.
///
/// # Errors
///
/// Returns an error if the configured CORS origin is not a valid header
/// value.
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let allowed_origin: HeaderValue = state.config.cors.allowed_origin.parse()?;

    let cors = CorsLayer::new()
        .allow_origin(allowed_origin)
        .allow_methods(Any)
        .allow_headers(Any);

    Ok(Router::new()
        .route("/api/chat", post(api_chat))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

// ─────────────────────────────────────────────────────────────────────────────
// API Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Request body for the chat API. The JSON field names are the published
/// contract consumed by the existing front-end.
#[derive(Debug, Deserialize)]
struct ChatRequest {
    /// User question.
    #[serde(rename = "pergunta", default)]
    question: String,
}

/// Successful response from the chat API.
#[derive(Debug, Serialize)]
struct ChatResponse {
    /// Generated answer.
    #[serde(rename = "resposta")]
    answer: String,
}

/// Error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    /// Short error category.
    #[serde(rename = "erro")]
    error: String,
    /// Human-readable failure detail.
    #[serde(rename = "detalhes", skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

/// POST /api/chat - Answer one question via the assistant workflow.
async fn api_chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, Json<ErrorResponse>)> {
    let request_id = uuid::Uuid::new_v4().to_string();

    // Reject before any remote call is made.
    if req.question.trim().is_empty() {
        tracing::info!(
            request_id = %request_id,
            "rejected empty question"
        );
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "question must not be empty".to_string(),
                details: None,
            }),
        ));
    }

    tracing::info!(
        request_id = %request_id,
        question = %req.question,
        "received chat request"
    );

    match state.orchestrator.answer(&req.question).await {
        Ok(answer) => {
            tracing::info!(
                request_id = %request_id,
                answer_length = answer.len(),
                "chat request answered"
            );
            Ok(Json(ChatResponse { answer }))
        }
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                error = %e,
                transport = e.is_transport(),
                "chat workflow failed"
            );
            let (status, category) = if e.is_transport() {
                (
                    StatusCode::BAD_GATEWAY,
                    "error communicating with the assistant API",
                )
            } else {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
            };
            Err((
                status,
                Json(ErrorResponse {
                    error: category.to_string(),
                    details: Some(e.to_string()),
                }),
            ))
        }
    }
}
