use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, patch, post},
};
use uuid::Uuid;

use crate::{
    db::entities::permission,
    routes::{ApiResult, JsonApiResponse, require_permission},
    services::{
        ServiceContext,
        crud_service::CrudService,
        role_service::{PermissionInput, PermissionPatch, RoleInput, RolePatch, RoleView},
    },
    state::AppState,
};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/roles", require_permission(get(list_roles), &state, "view:roles"))
        .route("/roles", require_permission(post(create_role), &state, "manage:roles"))
        .route(
            "/roles/permissions",
            require_permission(get(list_permissions), &state, "view:permissions"),
        )
        .route(
            "/roles/permissions",
            require_permission(post(create_permission), &state, "manage:permissions"),
        )
        .route(
            "/roles/permissions/{id}",
            require_permission(get(get_permission), &state, "view:permissions"),
        )
        .route(
            "/roles/permissions/{id}",
            require_permission(
                patch(update_permission).delete(delete_permission),
                &state,
                "manage:permissions",
            ),
        )
        .route("/roles/{id}", require_permission(get(get_role), &state, "view:roles"))
        .route(
            "/roles/{id}",
            require_permission(
                patch(update_role).delete(delete_role),
                &state,
                "manage:roles",
            ),
        )
        .with_state(state)
}

async fn list_roles(State(state): State<Arc<AppState>>) -> ApiResult<Vec<RoleView>> {
    let roles = ServiceContext::from_state(state.as_ref()).role().list().await?;
    JsonApiResponse::ok(roles)
}

async fn get_role(State(state): State<Arc<AppState>>, Path(id): Path<Uuid>) -> ApiResult<RoleView> {
    let role = ServiceContext::from_state(state.as_ref()).role().get(id).await?;
    JsonApiResponse::ok(role)
}

async fn create_role(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RoleInput>,
) -> ApiResult<RoleView> {
    let role = ServiceContext::from_state(state.as_ref())
        .role()
        .create(body)
        .await?;
    JsonApiResponse::created(role)
}

async fn update_role(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<RolePatch>,
) -> ApiResult<RoleView> {
    let role = ServiceContext::from_state(state.as_ref())
        .role()
        .update(id, body)
        .await?;
    JsonApiResponse::ok(role)
}

async fn delete_role(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    ServiceContext::from_state(state.as_ref())
        .role()
        .remove(id)
        .await?;
    JsonApiResponse::message("Role deleted successfully")
}

async fn list_permissions(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Vec<permission::Model>> {
    let permissions = ServiceContext::from_state(state.as_ref())
        .permission()
        .all()
        .await?;
    JsonApiResponse::ok(permissions)
}

async fn get_permission(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<permission::Model> {
    let permission = ServiceContext::from_state(state.as_ref())
        .permission()
        .find_by_id(id)
        .await?;
    JsonApiResponse::ok(permission)
}

async fn create_permission(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PermissionInput>,
) -> ApiResult<permission::Model> {
    let permission = ServiceContext::from_state(state.as_ref())
        .permission()
        .add(body)
        .await?;
    JsonApiResponse::created(permission)
}

async fn update_permission(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<PermissionPatch>,
) -> ApiResult<permission::Model> {
    let permission = ServiceContext::from_state(state.as_ref())
        .permission()
        .change(id, body)
        .await?;
    JsonApiResponse::ok(permission)
}

async fn delete_permission(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    ServiceContext::from_state(state.as_ref())
        .permission()
        .delete(id)
        .await?;
    JsonApiResponse::message("Permission deleted successfully")
}
