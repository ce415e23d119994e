//! HTTP Handlers

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use journal_core::UserId;

use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub store_connected: bool,
}

/// One inbound chat event, as forwarded by the transport gateway
#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub user_id: String,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub reply: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let store_connected = state.trades.health_check().await;

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        store_connected,
    })
}

/// Inbound message endpoint: one chat event in, one reply out
pub async fn message_handler(
    State(state): State<AppState>,
    Json(payload): Json<MessageRequest>,
) -> Result<Json<MessageResponse>, (StatusCode, Json<ErrorResponse>)> {
    if payload.user_id.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "user_id must not be empty".into(),
                code: "INVALID_USER".into(),
            }),
        ));
    }

    let user_id = UserId::from_string(payload.user_id.trim());
    let reply = state.engine.handle(&user_id, &payload.text).await;

    Ok(Json(MessageResponse { reply }))
}
