use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::HeaderValue,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};

use crate::{
    auth::{AuthSession, Claims, RegisterInput, ResetPasswordInput},
    middleware::{CSRF_COOKIE, CSRF_HEADER, new_csrf_token},
    routes::{ApiResult, JsonApiResponse},
    services::ServiceContext,
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct CsrfTokenResponse {
    pub csrf_token: String,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password", post(reset_password))
        .route("/auth/csrf-token", get(csrf_token))
        .with_state(state)
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterInput>,
) -> ApiResult<AuthSession> {
    let services = ServiceContext::from_state(state.as_ref());
    let session = services.auth(&state.auth_providers).register(body).await?;
    JsonApiResponse::created(session)
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> ApiResult<AuthSession> {
    let services = ServiceContext::from_state(state.as_ref());
    let session = services
        .auth(&state.auth_providers)
        .login(&body.email, &body.password)
        .await?;
    JsonApiResponse::ok(session)
}

async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RefreshRequest>,
) -> ApiResult<AuthSession> {
    let services = ServiceContext::from_state(state.as_ref());
    let session = services
        .auth(&state.auth_providers)
        .refresh(&body.refresh_token)
        .await?;
    JsonApiResponse::ok(session)
}

async fn logout(
    State(state): State<Arc<AppState>>,
    claims: Claims,
) -> ApiResult<serde_json::Value> {
    let services = ServiceContext::from_state(state.as_ref());
    services
        .auth(&state.auth_providers)
        .logout(claims.user_id()?)
        .await?;
    JsonApiResponse::message("Logged out successfully")
}

async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ForgotPasswordRequest>,
) -> ApiResult<serde_json::Value> {
    let services = ServiceContext::from_state(state.as_ref());
    let message = services
        .auth(&state.auth_providers)
        .forgot_password(&body.email)
        .await?;
    JsonApiResponse::message(message)
}

async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ResetPasswordInput>,
) -> ApiResult<serde_json::Value> {
    let services = ServiceContext::from_state(state.as_ref());
    services
        .auth(&state.auth_providers)
        .reset_password(body)
        .await?;
    JsonApiResponse::message("Password has been reset successfully")
}

/// Sets the double-submit cookie and echoes the token in a header and body.
async fn csrf_token(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let token = new_csrf_token();
    let cookie = Cookie::build((CSRF_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(state.config.security.production)
        .build();

    let mut response = (
        jar.add(cookie),
        JsonApiResponse {
            status: 200,
            message: "ok".to_string(),
            data: CsrfTokenResponse {
                csrf_token: token.clone(),
            },
        },
    )
        .into_response();
    if let Ok(value) = HeaderValue::from_str(&token) {
        response.headers_mut().insert(CSRF_HEADER, value);
    }
    response
}
