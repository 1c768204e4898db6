use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;

use crate::{
    common::{ApiError, ChannelId, GuildId},
    player::JoinError,
    server::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    pub channel_id: ChannelId,
}

/// POST /v1/players/{guildId}
pub async fn join_player(
    Path(guild_id): Path<GuildId>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<JoinRequest>,
) -> Result<StatusCode, ApiError> {
    tracing::info!("POST /v1/players/{} (channel {})", guild_id, body.channel_id);
    let path = format!("/v1/players/{guild_id}");

    match state.service.join(guild_id, body.channel_id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e @ JoinError::AlreadyConnected(_)) => Err(ApiError::conflict(e.to_string(), path)),
        Err(e @ JoinError::ConnectFailed(_)) => Err(ApiError::bad_gateway(e.to_string(), path)),
    }
}
