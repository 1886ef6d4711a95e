use axum::{
    Router,
    body::{self, Body},
    http::{Request, StatusCode, header},
};
use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

use affiliate_cms::{
    config::AppConfig,
    db::entities::{post, role_permission},
    middleware::{CSRF_COOKIE, CSRF_HEADER},
    routes::API_PREFIX,
    test_helpers::{bearer, test_app, test_config, test_state, user_model},
};

fn api_path(path: &str) -> String {
    format!("{API_PREFIX}{path}")
}

fn empty_db() -> DatabaseConnection {
    MockDatabase::new(DatabaseBackend::Postgres).into_connection()
}

fn app_with(db: DatabaseConnection, cfg: AppConfig) -> Router {
    test_app(test_state(db, cfg))
}

async fn json_response(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.expect("request should succeed");
    let status = response.status();
    let body = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should read");
    let json = serde_json::from_slice(&body).expect("body should be json");
    (status, json)
}

fn click_request(user_agent: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(api_path("/affiliates/click"))
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(agent) = user_agent {
        builder = builder.header(header::USER_AGENT, agent);
    }
    builder
        .body(Body::from(json!({ "code": "ABC123", "token": "t-1" }).to_string()))
        .expect("request")
}

#[tokio::test]
async fn public_post_list_needs_no_token() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<post::Model>::new()])
        .into_connection();
    let app = app_with(db, test_config());

    let (status, body) = json_response(
        app,
        Request::builder()
            .uri(api_path("/posts"))
            .body(Body::empty())
            .expect("request"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], 200);
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn protected_route_requires_bearer_token() {
    let app = app_with(empty_db(), test_config());

    let (status, body) = json_response(
        app,
        Request::builder()
            .uri(api_path("/affiliates"))
            .body(Body::empty())
            .expect("request"),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], 401);
    assert_eq!(body["message"], "Missing/invalid Authorization header");
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn missing_permission_is_forbidden() {
    let user = user_model(Uuid::new_v4(), "member@example.com", "hash");
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([[user.clone()]])
        .append_query_results([Vec::<role_permission::Model>::new()])
        .into_connection();
    let app = app_with(db, test_config());

    let (status, body) = json_response(
        app,
        Request::builder()
            .uri(api_path("/roles"))
            .header(header::AUTHORIZATION, bearer(user.id, "user"))
            .body(Body::empty())
            .expect("request"),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body["message"],
        "You do not have permission to perform this action"
    );
}

#[tokio::test]
async fn form_submissions_listing_is_admin_only() {
    let app = app_with(empty_db(), test_config());

    let (status, body) = json_response(
        app,
        Request::builder()
            .uri(api_path("/form-emails"))
            .header(header::AUTHORIZATION, bearer(Uuid::new_v4(), "user"))
            .body(Body::empty())
            .expect("request"),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Admin access only");
}

#[tokio::test]
async fn click_without_user_agent_is_rejected() {
    let app = app_with(empty_db(), test_config());

    let (status, body) = json_response(app, click_request(None)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "User agent is required");
}

#[tokio::test]
async fn unknown_route_uses_json_envelope() {
    let app = app_with(empty_db(), test_config());

    let (status, body) = json_response(
        app,
        Request::builder()
            .uri(api_path("/does-not-exist"))
            .body(Body::empty())
            .expect("request"),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], 404);
}

#[tokio::test]
async fn csrf_blocks_writes_without_matching_token() {
    let mut cfg = test_config();
    cfg.security.csrf_enabled = Some(true);
    let app = app_with(empty_db(), cfg);

    let (status, body) = json_response(app.clone(), click_request(Some("test-agent"))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Invalid CSRF token");

    let issued = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(api_path("/auth/csrf-token"))
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("csrf token response");
    assert_eq!(issued.status(), StatusCode::OK);
    let token = issued
        .headers()
        .get(CSRF_HEADER)
        .and_then(|value| value.to_str().ok())
        .expect("token header")
        .to_string();
    let set_cookie = issued
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .expect("cookie header");
    assert!(set_cookie.starts_with(&format!("{CSRF_COOKIE}={token}")));

    // With the token echoed the request reaches the handler.
    let mut request = click_request(None);
    request.headers_mut().insert(
        header::COOKIE,
        format!("{CSRF_COOKIE}={token}").parse().expect("cookie"),
    );
    request
        .headers_mut()
        .insert(CSRF_HEADER, token.parse().expect("header"));
    let (status, body) = json_response(app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "User agent is required");
}

#[tokio::test]
async fn general_rate_limit_returns_429_with_headers() {
    let mut cfg = test_config();
    cfg.security.rate_limit_enabled = true;
    cfg.security.general_rate_limit = 1;
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<post::Model>::new()])
        .into_connection();
    let app = app_with(db, cfg);
    let request = || {
        Request::builder()
            .uri(api_path("/posts"))
            .body(Body::empty())
            .expect("request")
    };

    let first = app.clone().oneshot(request()).await.expect("first");
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(
        first
            .headers()
            .get("x-ratelimit-remaining")
            .and_then(|value| value.to_str().ok()),
        Some("0")
    );

    let second = app.oneshot(request()).await.expect("second");
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(second.headers().contains_key(header::RETRY_AFTER));
    assert!(second.headers().contains_key("x-ratelimit-reset"));
}
