use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    auth::AdminRole,
    db::entities::{form_affiliate, form_email},
    routes::{ApiResult, AuthRoleGuard, JsonApiResponse},
    services::{
        ServiceContext,
        crud_service::CrudService,
        form_service::{FormAffiliateInput, FormAffiliatePatch, FormEmailInput},
    },
    state::AppState,
};

// Submissions are public; reading and moderating them is admin only.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/form-emails", post(submit_email).get(list_emails))
        .route(
            "/form-emails/{id}",
            get(get_email).patch(update_email).delete(delete_email),
        )
        .route("/form-affiliate", post(submit_affiliate).get(list_affiliates))
        .route(
            "/form-affiliate/{id}",
            get(get_affiliate)
                .patch(update_affiliate)
                .delete(delete_affiliate),
        )
        .with_state(state)
}

async fn submit_email(
    State(state): State<Arc<AppState>>,
    Json(body): Json<FormEmailInput>,
) -> ApiResult<form_email::Model> {
    let created = ServiceContext::from_state(state.as_ref())
        .form_email()
        .submit(body)
        .await?;
    JsonApiResponse::created(created)
}

async fn list_emails(
    State(state): State<Arc<AppState>>,
    _guard: AuthRoleGuard<AdminRole>,
) -> ApiResult<Vec<form_email::Model>> {
    let rows = ServiceContext::from_state(state.as_ref())
        .form_email()
        .all()
        .await?;
    JsonApiResponse::ok(rows)
}

async fn get_email(
    State(state): State<Arc<AppState>>,
    _guard: AuthRoleGuard<AdminRole>,
    Path(id): Path<Uuid>,
) -> ApiResult<form_email::Model> {
    let row = ServiceContext::from_state(state.as_ref())
        .form_email()
        .find_by_id(id)
        .await?;
    JsonApiResponse::ok(row)
}

async fn update_email(
    State(state): State<Arc<AppState>>,
    _guard: AuthRoleGuard<AdminRole>,
    Path(id): Path<Uuid>,
    Json(body): Json<FormEmailInput>,
) -> ApiResult<form_email::Model> {
    let row = ServiceContext::from_state(state.as_ref())
        .form_email()
        .change(id, body)
        .await?;
    JsonApiResponse::ok(row)
}

async fn delete_email(
    State(state): State<Arc<AppState>>,
    _guard: AuthRoleGuard<AdminRole>,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    ServiceContext::from_state(state.as_ref())
        .form_email()
        .delete(id)
        .await?;
    JsonApiResponse::message("Form email deleted successfully")
}

async fn submit_affiliate(
    State(state): State<Arc<AppState>>,
    Json(body): Json<FormAffiliateInput>,
) -> ApiResult<form_affiliate::Model> {
    let created = ServiceContext::from_state(state.as_ref())
        .form_affiliate()
        .submit(body)
        .await?;
    JsonApiResponse::created(created)
}

async fn list_affiliates(
    State(state): State<Arc<AppState>>,
    _guard: AuthRoleGuard<AdminRole>,
) -> ApiResult<Vec<form_affiliate::Model>> {
    let rows = ServiceContext::from_state(state.as_ref())
        .form_affiliate()
        .all()
        .await?;
    JsonApiResponse::ok(rows)
}

async fn get_affiliate(
    State(state): State<Arc<AppState>>,
    _guard: AuthRoleGuard<AdminRole>,
    Path(id): Path<Uuid>,
) -> ApiResult<form_affiliate::Model> {
    let row = ServiceContext::from_state(state.as_ref())
        .form_affiliate()
        .find_by_id(id)
        .await?;
    JsonApiResponse::ok(row)
}

async fn update_affiliate(
    State(state): State<Arc<AppState>>,
    _guard: AuthRoleGuard<AdminRole>,
    Path(id): Path<Uuid>,
    Json(body): Json<FormAffiliatePatch>,
) -> ApiResult<form_affiliate::Model> {
    let row = ServiceContext::from_state(state.as_ref())
        .form_affiliate()
        .change(id, body)
        .await?;
    JsonApiResponse::ok(row)
}

async fn delete_affiliate(
    State(state): State<Arc<AppState>>,
    _guard: AuthRoleGuard<AdminRole>,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    ServiceContext::from_state(state.as_ref())
        .form_affiliate()
        .delete(id)
        .await?;
    JsonApiResponse::message("Form affiliate deleted successfully")
}
