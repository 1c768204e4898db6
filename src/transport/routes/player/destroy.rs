use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
};

use crate::{common::GuildId, server::AppState};

/// DELETE /v1/players/{guildId}
///
/// Always 204; leaving a guild that was never joined is a no-op.
pub async fn destroy_player(
    Path(guild_id): Path<GuildId>,
    State(state): State<Arc<AppState>>,
) -> StatusCode {
    tracing::info!("DELETE /v1/players/{}", guild_id);
    state.service.leave(guild_id).await;
    StatusCode::NO_CONTENT
}
