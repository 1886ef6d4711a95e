use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use rand::RngCore;

use crate::{error::AppError, state::AppState};

pub const CSRF_COOKIE: &str = "csrf_token";
pub const CSRF_HEADER: &str = "x-csrf-token";
const WEBHOOK_PREFIX: &str = "/webhook/";

pub fn new_csrf_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn is_safe(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Double-submit check: the header must echo the `csrf_token` cookie on
/// every state-changing request.
pub async fn csrf_middleware(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if !state.config.security.csrf_enabled()
        || is_safe(req.method())
        || req.uri().path().starts_with(WEBHOOK_PREFIX)
    {
        return Ok(next.run(req).await);
    }

    let header = req
        .headers()
        .get(CSRF_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let matches = jar
        .get(CSRF_COOKIE)
        .is_some_and(|cookie| !header.is_empty() && cookie.value() == header);
    if !matches {
        return Err(AppError::forbidden("Invalid CSRF token"));
    }
    Ok(next.run(req).await)
}
