use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{delete, get, post},
};
use tower_http::trace::TraceLayer;

use crate::{
    server::AppState,
    transport::{
        middleware::{add_response_headers, check_auth},
        routes::{info, player},
    },
};

const API_V1: &str = "/v1";

pub fn router(state: Arc<AppState>) -> Router {
    let v1_routes = Router::new()
        .route("/info", get(info::get_info))
        .route("/players", get(player::get_players))
        .route(
            "/players/{guild_id}",
            get(player::get_player)
                .post(player::join_player)
                .patch(player::update_player)
                .delete(player::destroy_player),
        )
        .route(
            "/players/{guild_id}/queue",
            post(player::enqueue_track).delete(player::clear_queue),
        )
        .route("/players/{guild_id}/queue/shuffle", post(player::shuffle_queue))
        .route("/players/{guild_id}/queue/{position}", delete(player::remove_track));

    Router::new()
        .nest(API_V1, v1_routes)
        .route("/version", get(info::get_version))
        .layer(middleware::from_fn_with_state(state.clone(), check_auth))
        .layer(middleware::from_fn(add_response_headers))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
