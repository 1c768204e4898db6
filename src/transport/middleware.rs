use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::{common::ApiError, server::AppState};

pub const API_VERSION_HEADER: &str = "Guildtune-Api-Version";
pub const API_VERSION: &str = "1";

#[derive(Debug, PartialEq, Eq)]
enum AuthFailure {
    Missing,
    Invalid,
}

/// Accepts either the raw password or `Bearer <password>`.
/// An empty configured password turns authentication off.
fn authorize(headers: &HeaderMap, password: &str) -> Result<(), AuthFailure> {
    if password.is_empty() {
        return Ok(());
    }

    let presented = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthFailure::Missing)?;
    let presented = presented.strip_prefix("Bearer ").unwrap_or(presented);

    if presented == password {
        Ok(())
    } else {
        Err(AuthFailure::Invalid)
    }
}

pub async fn check_auth(State(state): State<Arc<AppState>>, req: Request, next: Next) -> Response {
    match authorize(req.headers(), &state.config.server.password) {
        Ok(()) => next.run(req).await,
        Err(failure) => {
            let path = req.uri().path().to_string();
            warn!("{} {}: unauthorized ({:?})", req.method(), path, failure);
            let message = match failure {
                AuthFailure::Missing => "Missing Authorization header",
                AuthFailure::Invalid => "Invalid password",
            };
            ApiError::unauthorized(message, path).into_response()
        }
    }
}

pub async fn add_response_headers(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    response
        .headers_mut()
        .insert(API_VERSION_HEADER, HeaderValue::from_static(API_VERSION));
    response
}
