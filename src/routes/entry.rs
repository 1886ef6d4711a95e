use std::sync::Arc;

use axum::{Router, middleware};
use tower_http::services::ServeDir;

use crate::{
    middleware::{csrf_middleware, rate_limit_middleware},
    state::AppState,
};

use super::api;

pub const API_PREFIX: &str = "/api";
pub const UPLOADS_PREFIX: &str = "/uploads";

/// API routes plus uploaded files. The rate limiter runs before the CSRF
/// check so rejected requests still count.
pub fn router(state: Arc<AppState>) -> Router {
    let uploads = ServeDir::new(&state.config.storage.upload_dir);
    Router::new()
        .nest(API_PREFIX, api::router(state.clone()))
        .nest_service(UPLOADS_PREFIX, uploads)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            csrf_middleware,
        ))
        .layer(middleware::from_fn_with_state(state, rate_limit_middleware))
}
