use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, header},
    routing::{delete, get, patch, post},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    db::{
        dao::ClickSource,
        entities::{affiliate, affiliate_click},
    },
    error::AppError,
    middleware::ClientIp,
    routes::{ApiResult, JsonApiResponse, require_permission},
    services::{
        ServiceContext,
        affiliate_service::{AffiliateInput, AffiliatePatch, Caller, ClickInput, ClickResult},
        stats::{AffiliateClicks, DashboardStats, StatsFilter, TimeStats, UserClicks},
    },
    state::AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct TimeStatsQuery {
    pub affiliate_id: Option<Uuid>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/affiliates",
            require_permission(post(create_affiliate), &state, "create:affiliate"),
        )
        .route(
            "/affiliates",
            require_permission(get(list_affiliates), &state, "view:affiliate"),
        )
        .route("/affiliates/click", post(track_click))
        .route("/affiliates/dashboard/stats", get(dashboard_stats))
        .route("/affiliates/stats/top", get(top_affiliates))
        .route("/affiliates/stats/user-stats", get(user_stats))
        .route("/affiliates/stats/time-stats", get(time_stats))
        .route(
            "/affiliates/{id}",
            require_permission(get(get_affiliate), &state, "view:affiliate"),
        )
        .route(
            "/affiliates/{id}",
            require_permission(patch(update_affiliate), &state, "update:affiliate"),
        )
        .route(
            "/affiliates/{id}",
            require_permission(delete(delete_affiliate), &state, "delete:affiliate"),
        )
        .route("/affiliates/{id}/clicks", get(affiliate_clicks))
        .with_state(state)
}

async fn create_affiliate(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Json(body): Json<AffiliateInput>,
) -> ApiResult<affiliate::Model> {
    let created = ServiceContext::from_state(state.as_ref())
        .affiliate()
        .create(caller, body)
        .await?;
    JsonApiResponse::created(created)
}

async fn list_affiliates(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> ApiResult<Vec<affiliate::Model>> {
    let affiliates = ServiceContext::from_state(state.as_ref())
        .affiliate()
        .list(caller)
        .await?;
    JsonApiResponse::ok(affiliates)
}

async fn get_affiliate(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> ApiResult<affiliate::Model> {
    let affiliate = ServiceContext::from_state(state.as_ref())
        .affiliate()
        .get(caller, id)
        .await?;
    JsonApiResponse::ok(affiliate)
}

async fn update_affiliate(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(body): Json<AffiliatePatch>,
) -> ApiResult<affiliate::Model> {
    let updated = ServiceContext::from_state(state.as_ref())
        .affiliate()
        .update(caller, id, body)
        .await?;
    JsonApiResponse::ok(updated)
}

async fn delete_affiliate(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    ServiceContext::from_state(state.as_ref())
        .affiliate()
        .remove(caller, id)
        .await?;
    JsonApiResponse::message("Affiliate deleted successfully")
}

async fn affiliate_clicks(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> ApiResult<Vec<affiliate_click::Model>> {
    let clicks = ServiceContext::from_state(state.as_ref())
        .affiliate()
        .clicks(caller, id)
        .await?;
    JsonApiResponse::ok(clicks)
}

/// Public click beacon; the caller's address and agent identify the source.
async fn track_click(
    State(state): State<Arc<AppState>>,
    ClientIp(ip_address): ClientIp,
    headers: HeaderMap,
    Json(body): Json<ClickInput>,
) -> ApiResult<ClickResult> {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|agent| !agent.is_empty())
        .ok_or_else(|| AppError::bad_request("User agent is required"))?;

    let source = ClickSource {
        ip_address: &ip_address,
        user_agent,
    };
    let result = ServiceContext::from_state(state.as_ref())
        .affiliate()
        .record_click(body, source)
        .await?;
    JsonApiResponse::ok(result)
}

async fn dashboard_stats(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Query(filter): Query<StatsFilter>,
) -> ApiResult<DashboardStats> {
    let stats = ServiceContext::from_state(state.as_ref())
        .affiliate()
        .dashboard(caller, filter)
        .await?;
    JsonApiResponse::ok(stats)
}

async fn top_affiliates(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Query(filter): Query<StatsFilter>,
) -> ApiResult<Vec<AffiliateClicks>> {
    let top = ServiceContext::from_state(state.as_ref())
        .affiliate()
        .top(caller, filter)
        .await?;
    JsonApiResponse::ok(top)
}

async fn user_stats(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Query(filter): Query<StatsFilter>,
) -> ApiResult<Vec<UserClicks>> {
    let totals = ServiceContext::from_state(state.as_ref())
        .affiliate()
        .user_stats(caller, filter)
        .await?;
    JsonApiResponse::ok(totals)
}

async fn time_stats(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Query(query): Query<TimeStatsQuery>,
) -> ApiResult<TimeStats> {
    let stats = ServiceContext::from_state(state.as_ref())
        .affiliate()
        .time_stats(caller, query.affiliate_id)
        .await?;
    JsonApiResponse::ok(stats)
}
