use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    routing::{delete, get, patch, post},
};
use uuid::Uuid;

use crate::{
    auth::Claims,
    error::AppError,
    routes::{
        ApiResult, JsonApiResponse,
        multipart::{FormParts, upload_body_limit},
        require_permission,
    },
    services::{
        ServiceContext,
        user_service::{AVATAR_FIELD, ProfilePatch, UserInput, UserPatch, UserView},
    },
    state::AppState,
};

pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = upload_body_limit(&state.config.storage);
    Router::new()
        .route(
            "/users",
            require_permission(post(create_user), &state, "create:user")
                .layer(body_limit.clone()),
        )
        .route("/users", require_permission(get(list_users), &state, "view:user"))
        .route("/users/by-name/{name}", get(user_by_name))
        .route("/users/profile/me", get(get_profile).patch(update_profile))
        .route("/users/{id}", require_permission(get(get_user), &state, "view:user"))
        .route(
            "/users/{id}",
            require_permission(patch(update_user), &state, "update:user").layer(body_limit),
        )
        .route(
            "/users/{id}",
            require_permission(delete(delete_user), &state, "delete:user"),
        )
        .with_state(state)
}

async fn read_user_form(multipart: Multipart) -> Result<(UserPatch, FormParts), AppError> {
    let mut form = FormParts::read(multipart, &[AVATAR_FIELD]).await?;
    let patch = UserPatch {
        email: form.text("email"),
        password: form.text("password"),
        name: form.text("name"),
        role_id: form.uuid("role_id")?,
        code_aff: form.text("code_aff"),
    };
    Ok((patch, form))
}

async fn create_user(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    multipart: Multipart,
) -> ApiResult<UserView> {
    let (fields, form) = read_user_form(multipart).await?;
    let input = UserInput {
        email: fields.email.unwrap_or_default(),
        password: fields.password.unwrap_or_default(),
        name: fields.name,
        role_id: fields.role_id,
        code_aff: fields.code_aff,
    };
    let user = ServiceContext::from_state(state.as_ref())
        .user()
        .create(claims.user_id()?, input, form.files)
        .await?;
    JsonApiResponse::created(user)
}

async fn list_users(
    State(state): State<Arc<AppState>>,
    claims: Claims,
) -> ApiResult<Vec<UserView>> {
    let users = ServiceContext::from_state(state.as_ref())
        .user()
        .list(claims.user_id()?)
        .await?;
    JsonApiResponse::ok(users)
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<UserView> {
    let user = ServiceContext::from_state(state.as_ref())
        .user()
        .get(id)
        .await?;
    JsonApiResponse::ok(user)
}

async fn user_by_name(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<UserView> {
    let user = ServiceContext::from_state(state.as_ref())
        .user()
        .by_name(&name)
        .await?;
    JsonApiResponse::ok(user)
}

async fn update_user(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> ApiResult<UserView> {
    let (patch, form) = read_user_form(multipart).await?;
    let user = ServiceContext::from_state(state.as_ref())
        .user()
        .update(claims.user_id()?, id, patch, form.files)
        .await?;
    JsonApiResponse::ok(user)
}

async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    ServiceContext::from_state(state.as_ref())
        .user()
        .remove(id)
        .await?;
    JsonApiResponse::message("User deleted successfully")
}

async fn get_profile(State(state): State<Arc<AppState>>, claims: Claims) -> ApiResult<UserView> {
    let user = ServiceContext::from_state(state.as_ref())
        .user()
        .profile(claims.user_id()?)
        .await?;
    JsonApiResponse::ok(user)
}

async fn update_profile(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    Json(body): Json<ProfilePatch>,
) -> ApiResult<UserView> {
    let user = ServiceContext::from_state(state.as_ref())
        .user()
        .update_profile(claims.user_id()?, body)
        .await?;
    JsonApiResponse::ok(user)
}
