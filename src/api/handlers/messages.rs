//! Inbound chat message handler.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{InboundMessageRequest, InboundMessageResponse};
use crate::app_state::AppState;
use crate::error::{ErrorResponse, RelayError};

/// `POST /messages` — Hand one chat message to the command interpreter.
///
/// # Errors
///
/// Returns [`RelayError::InvalidCommand`] if the author is empty.
#[utoipa::path(
    post,
    path = "/api/v1/messages",
    tag = "Messages",
    summary = "Submit an inbound chat message",
    description = "Runs the message through the command interpreter and returns the reply the bridge should post in the same channel, or null if the message is not addressed to the relay.",
    request_body = InboundMessageRequest,
    responses(
        (status = 200, description = "Message handled", body = InboundMessageResponse),
        (status = 400, description = "Malformed request", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn submit_message(
    State(state): State<AppState>,
    Json(req): Json<InboundMessageRequest>,
) -> Result<Json<InboundMessageResponse>, RelayError> {
    if req.author.trim().is_empty() {
        return Err(RelayError::InvalidCommand("author must not be empty".to_string()));
    }
    let reply = state
        .interpreter
        .handle(&req.author, req.channel_id, &req.content)
        .await;
    Ok(Json(InboundMessageResponse { reply }))
}

/// Message routes, mounted under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new().route("/messages", post(submit_message))
}
