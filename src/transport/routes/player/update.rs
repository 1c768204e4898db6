use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::Deserialize;

use super::player_not_found;
use crate::{
    common::{ApiError, GuildId},
    player::StateSnapshot,
    server::AppState,
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerUpdate {
    pub paused: Option<bool>,
    /// Linear gain, clamped to 0.0..=2.0.
    pub volume: Option<f32>,
    #[serde(default)]
    pub skip: bool,
}

/// PATCH /v1/players/{guildId}
pub async fn update_player(
    Path(guild_id): Path<GuildId>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<PlayerUpdate>,
) -> Result<Json<StateSnapshot>, ApiError> {
    tracing::info!("PATCH /v1/players/{}: {:?}", guild_id, body);
    let service = &state.service;

    if service.get_state(guild_id).is_none() {
        return Err(player_not_found(guild_id, format!("/v1/players/{guild_id}")));
    }

    match body.paused {
        Some(true) => service.pause(guild_id),
        Some(false) => service.resume(guild_id),
        None => {}
    }
    if let Some(volume) = body.volume {
        service.set_volume(guild_id, volume);
    }
    if body.skip {
        service.skip(guild_id);
    }

    service
        .get_state(guild_id)
        .map(Json)
        .ok_or_else(|| player_not_found(guild_id, format!("/v1/players/{guild_id}")))
}
