use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

use super::{affiliates, auth, forms, media, posts, roles, users};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(auth::router(state.clone()))
        .merge(users::router(state.clone()))
        .merge(roles::router(state.clone()))
        .merge(posts::router(state.clone()))
        .merge(media::router(state.clone()))
        .merge(affiliates::router(state.clone()))
        .merge(forms::router(state))
}
