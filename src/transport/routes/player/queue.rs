use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::Deserialize;
use serde_json::{Value, json};

use super::player_not_found;
use crate::{
    audio::TrackInfo,
    common::{ApiError, GuildId},
    server::AppState,
    sources::ResolveError,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnqueueRequest {
    pub identifier: String,
    pub requester: Option<String>,
}

fn queue_path(guild_id: GuildId) -> String {
    format!("/v1/players/{guild_id}/queue")
}

/// POST /v1/players/{guildId}/queue
pub async fn enqueue_track(
    Path(guild_id): Path<GuildId>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<EnqueueRequest>,
) -> Result<Json<TrackInfo>, ApiError> {
    tracing::info!("POST /v1/players/{}/queue: '{}'", guild_id, body.identifier);
    let path = queue_path(guild_id);

    if state.service.get_state(guild_id).is_none() {
        return Err(player_not_found(guild_id, path));
    }
    if body.identifier.trim().is_empty() {
        return Err(ApiError::bad_request("identifier must not be empty", path));
    }

    let requester = body.requester.as_deref().unwrap_or("api");
    let track = state
        .sources
        .resolve(&body.identifier, requester)
        .await
        .map_err(|e| match e {
            ResolveError::NotFound(_) => ApiError::not_found(e.to_string(), path.clone()),
            ResolveError::Unsupported(_) | ResolveError::Probe(_) => {
                ApiError::bad_request(e.to_string(), path.clone())
            }
            ResolveError::Tool { .. } | ResolveError::Io(_) | ResolveError::Json(_) => {
                ApiError::bad_gateway(e.to_string(), path.clone())
            }
        })?;

    let info = track.info.clone();
    if !state.service.enqueue(guild_id, track) {
        return Err(player_not_found(guild_id, path));
    }
    Ok(Json(info))
}

/// DELETE /v1/players/{guildId}/queue
pub async fn clear_queue(
    Path(guild_id): Path<GuildId>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    tracing::info!("DELETE /v1/players/{}/queue", guild_id);
    if state.service.get_state(guild_id).is_none() {
        return Err(player_not_found(guild_id, queue_path(guild_id)));
    }
    Ok(Json(json!({ "count": state.service.clear_queue(guild_id) })))
}

/// POST /v1/players/{guildId}/queue/shuffle
pub async fn shuffle_queue(
    Path(guild_id): Path<GuildId>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    tracing::info!("POST /v1/players/{}/queue/shuffle", guild_id);
    if state.service.get_state(guild_id).is_none() {
        return Err(player_not_found(
            guild_id,
            format!("/v1/players/{guild_id}/queue/shuffle"),
        ));
    }
    Ok(Json(json!({ "count": state.service.shuffle(guild_id) })))
}

/// DELETE /v1/players/{guildId}/queue/{position}
///
/// `position` is 1-based, matching what `upcoming` shows to users.
pub async fn remove_track(
    Path((guild_id, position)): Path<(GuildId, usize)>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<TrackInfo>, ApiError> {
    tracing::info!("DELETE /v1/players/{}/queue/{}", guild_id, position);
    let path = format!("/v1/players/{guild_id}/queue/{position}");

    if state.service.get_state(guild_id).is_none() {
        return Err(player_not_found(guild_id, path));
    }
    state
        .service
        .remove(guild_id, position)
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("No track at position {position}"), path))
}
