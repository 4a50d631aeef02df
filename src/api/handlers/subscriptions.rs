//! Read-only listings of a channel's pollers and alarms.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{AlarmListResponse, PollerListResponse};
use crate::app_state::AppState;
use crate::domain::ChannelId;
use crate::error::{ErrorResponse, RelayError};

/// `GET /channels/{channel_id}/pollers` — Games followed in a channel.
///
/// # Errors
///
/// Returns [`RelayError::Persistence`] if the store fails.
#[utoipa::path(
    get,
    path = "/api/v1/channels/{channel_id}/pollers",
    tag = "Subscriptions",
    summary = "List followed games",
    params(("channel_id" = i64, Path, description = "Chat channel identifier")),
    responses(
        (status = 200, description = "Pollers of the channel", body = PollerListResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn list_pollers(
    State(state): State<AppState>,
    Path(channel_id): Path<i64>,
) -> Result<Json<PollerListResponse>, RelayError> {
    let channel_id = ChannelId::new(channel_id);
    let pollers = state.store.pollers_for_channel(channel_id).await?;
    Ok(Json(PollerListResponse {
        channel_id,
        pollers,
    }))
}

/// `GET /channels/{channel_id}/alarms` — Alarm thresholds of a channel.
///
/// # Errors
///
/// Returns [`RelayError::Persistence`] if the store fails.
#[utoipa::path(
    get,
    path = "/api/v1/channels/{channel_id}/alarms",
    tag = "Subscriptions",
    summary = "List alarms",
    params(("channel_id" = i64, Path, description = "Chat channel identifier")),
    responses(
        (status = 200, description = "Alarms of the channel", body = AlarmListResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
    ),
    security(("bearer" = []))
)]
pub async fn list_alarms(
    State(state): State<AppState>,
    Path(channel_id): Path<i64>,
) -> Result<Json<AlarmListResponse>, RelayError> {
    let channel_id = ChannelId::new(channel_id);
    let alarms = state.store.alarms_for_channel(channel_id).await?;
    Ok(Json(AlarmListResponse { channel_id, alarms }))
}

/// Subscription routes, mounted under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/channels/{channel_id}/pollers", get(list_pollers))
        .route("/channels/{channel_id}/alarms", get(list_alarms))
}
