use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    routing::{get, post, put},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::Claims,
    db::{dao::ModelRef, entities::model_has_media},
    routes::{
        ApiResult, JsonApiResponse,
        multipart::{FormParts, upload_body_limit},
    },
    services::{
        ServiceContext,
        media_service::{LinkMediaInput, MediaListQuery, MediaPage, MediaView, UploadForm},
    },
    state::AppState,
};

const UPLOAD_FIELD: &str = "files";

#[derive(Debug, Deserialize)]
pub struct ModelMediaQuery {
    pub model_type: String,
    pub model_id: Uuid,
    pub collection: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MediaPropertiesRequest {
    #[serde(default)]
    pub custom_properties: serde_json::Value,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/media", get(list_media))
        .route("/media/model-media", get(model_media))
        .route(
            "/media/upload",
            post(upload_media).layer(upload_body_limit(&state.config.storage)),
        )
        .route("/media/link-to-model", post(link_to_model))
        .route("/media/{id}", put(update_media).delete(delete_media))
        .with_state(state)
}

async fn list_media(
    State(state): State<Arc<AppState>>,
    _claims: Claims,
    Query(query): Query<MediaListQuery>,
) -> ApiResult<MediaPage> {
    let page = ServiceContext::from_state(state.as_ref())
        .media()
        .list(query)
        .await?;
    JsonApiResponse::ok(page)
}

async fn model_media(
    State(state): State<Arc<AppState>>,
    _claims: Claims,
    Query(query): Query<ModelMediaQuery>,
) -> ApiResult<Vec<MediaView>> {
    let owner = ModelRef {
        model_type: &query.model_type,
        model_id: query.model_id,
    };
    let media = ServiceContext::from_state(state.as_ref())
        .media()
        .model_media(&owner, query.collection.as_deref())
        .await?;
    JsonApiResponse::ok(media)
}

async fn upload_media(
    State(state): State<Arc<AppState>>,
    claims: Claims,
    multipart: Multipart,
) -> ApiResult<Vec<MediaView>> {
    let mut form = FormParts::read(multipart, &[UPLOAD_FIELD]).await?;
    let upload = UploadForm {
        collection_name: form.text("collection_name"),
        model_type: form.text("model_type"),
        model_id: form.uuid("model_id")?,
        field_type: form.text("field_type"),
    };
    let stored = ServiceContext::from_state(state.as_ref())
        .media()
        .upload(claims.user_id()?, form.files, upload)
        .await?;
    JsonApiResponse::created(stored)
}

async fn update_media(
    State(state): State<Arc<AppState>>,
    _claims: Claims,
    Path(id): Path<Uuid>,
    Json(body): Json<MediaPropertiesRequest>,
) -> ApiResult<MediaView> {
    let media = ServiceContext::from_state(state.as_ref())
        .media()
        .update_properties(id, body.custom_properties)
        .await?;
    JsonApiResponse::ok(media)
}

async fn delete_media(
    State(state): State<Arc<AppState>>,
    _claims: Claims,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    ServiceContext::from_state(state.as_ref())
        .media()
        .remove(id)
        .await?;
    JsonApiResponse::message("Media deleted successfully")
}

async fn link_to_model(
    State(state): State<Arc<AppState>>,
    _claims: Claims,
    Json(body): Json<LinkMediaInput>,
) -> ApiResult<Vec<model_has_media::Model>> {
    let links = ServiceContext::from_state(state.as_ref())
        .media()
        .link_to_model(body)
        .await?;
    JsonApiResponse::ok(links)
}
