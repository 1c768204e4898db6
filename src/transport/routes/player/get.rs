use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::Json,
};

use super::player_not_found;
use crate::{
    common::{ApiError, GuildId},
    player::StateSnapshot,
    server::AppState,
};

/// GET /v1/players
pub async fn get_players(State(state): State<Arc<AppState>>) -> Json<Vec<StateSnapshot>> {
    tracing::debug!("GET /v1/players");
    Json(state.service.snapshots())
}

/// GET /v1/players/{guildId}
pub async fn get_player(
    Path(guild_id): Path<GuildId>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<StateSnapshot>, ApiError> {
    tracing::debug!("GET /v1/players/{}", guild_id);
    state
        .service
        .get_state(guild_id)
        .map(Json)
        .ok_or_else(|| player_not_found(guild_id, format!("/v1/players/{guild_id}")))
}
