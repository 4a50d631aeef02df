//! DTOs for the per-channel subscription listings.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::ChannelId;
use crate::persistence::{Alarm, Poller};

/// Response body for `GET /api/v1/channels/{channel_id}/pollers`.
#[derive(Debug, Serialize, ToSchema)]
pub struct PollerListResponse {
    /// Channel the listing belongs to.
    pub channel_id: ChannelId,
    /// Followed games, oldest first.
    pub pollers: Vec<Poller>,
}

/// Response body for `GET /api/v1/channels/{channel_id}/alarms`.
#[derive(Debug, Serialize, ToSchema)]
pub struct AlarmListResponse {
    /// Channel the listing belongs to.
    pub channel_id: ChannelId,
    /// Alarm thresholds, oldest first.
    pub alarms: Vec<Alarm>,
}
