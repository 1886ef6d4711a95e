use std::sync::Arc;

use axum::{
    Router,
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
        post_service::{POST_IMAGE_FIELD, PostInput, PostPatch, PostView},
    },
    state::AppState,
};

pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = upload_body_limit(&state.config.storage);
    Router::new()
        .route("/posts", get(list_posts))
        .route(
            "/posts",
            require_permission(post(create_post), &state, "create:post").layer(body_limit.clone()),
        )
        .route("/posts/slug/{slug}", get(post_by_slug))
        .route("/posts/{id}", get(get_post))
        .route(
            "/posts/{id}",
            require_permission(patch(update_post), &state, "update:post").layer(body_limit),
        )
        .route(
            "/posts/{id}",
            require_permission(delete(delete_post), &state, "delete:post"),
        )
        .with_state(state)
}

async fn read_post_form(multipart: Multipart) -> Result<(PostPatch, FormParts), AppError> {
    let mut form = FormParts::read(multipart, &[POST_IMAGE_FIELD]).await?;
    let patch = PostPatch {
        title: form.text("title"),
        content: form.text("content"),
        description: form.text("description"),
        published: form.flag("published")?,
        collection: form.text("collection"),
    };
    Ok((patch, form))
}

async fn list_posts(State(state): State<Arc<AppState>>) -> ApiResult<Vec<PostView>> {
    let posts = ServiceContext::from_state(state.as_ref()).post().list().await?;
    JsonApiResponse::ok(posts)
}

async fn get_post(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> ApiResult<PostView> {
    let post = ServiceContext::from_state(state.as_ref()).post().get(id).await?;
    JsonApiResponse::ok(post)
}

async fn post_by_slug(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> ApiResult<PostView> {
    let post = ServiceContext::from_state(state.as_ref())
        .post()
        .get_by_slug(&slug)
        .await?;
    JsonApiResponse::ok(post)
}

async fn create_post(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    multipart: Multipart,
) -> ApiResult<PostView> {
    let (fields, form) = read_post_form(multipart).await?;
    let input = PostInput {
        title: fields.title.unwrap_or_default(),
        content: fields.content.unwrap_or_default(),
        description: fields.description,
        published: fields.published,
        collection: fields.collection,
    };
    let post = ServiceContext::from_state(state.as_ref())
        .post()
        .create(claims.user_id()?, form.files, input)
        .await?;
    JsonApiResponse::created(post)
}

async fn update_post(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> ApiResult<PostView> {
    let (patch, form) = read_post_form(multipart).await?;
    let post = ServiceContext::from_state(state.as_ref())
        .post()
        .update(id, patch, form.files, claims.user_id()?)
        .await?;
    JsonApiResponse::ok(post)
}

async fn delete_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    ServiceContext::from_state(state.as_ref())
        .post()
        .remove(id)
        .await?;
    JsonApiResponse::message("Post deleted successfully")
}
