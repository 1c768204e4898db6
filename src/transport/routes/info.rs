use std::sync::Arc;

use axum::{extract::State, response::Json};
use serde::Serialize;

use crate::{common::BuildInfo, server::AppState};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Info {
    pub build: BuildInfo,
    pub sources: Vec<String>,
    pub players: usize,
}

/// GET /version
pub async fn get_version() -> String {
    tracing::debug!("GET /version");
    env!("CARGO_PKG_VERSION").to_string()
}

/// GET /v1/info
pub async fn get_info(State(state): State<Arc<AppState>>) -> Json<Info> {
    tracing::debug!("GET /v1/info");
    Json(Info {
        build: BuildInfo::default(),
        sources: state.sources.names().into_iter().map(str::to_string).collect(),
        players: state.service.guilds().len(),
    })
}
