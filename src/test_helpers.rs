use std::sync::Arc;

use axum::{Router, middleware};
use chrono::{DateTime, FixedOffset, TimeZone};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::{
    auth::{
        bootstrap::build_providers,
        jwt::{JwtKeys, encode_token, make_claims},
        providers::AuthProviderId,
    },
    config::{AppConfig, AuthConfig},
    db::entities::{affiliate, media, post, role, user},
    middleware::{catch_panic_layer, json_error_middleware},
    routes::router,
    services::ServiceContext,
    state::AppState,
};

pub const TEST_JWT_SECRET: &str = "test-access-secret";
pub const TEST_REFRESH_SECRET: &str = "test-refresh-secret";

pub fn ts() -> DateTime<FixedOffset> {
    FixedOffset::east_opt(0)
        .expect("offset should be valid")
        .with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
        .single()
        .expect("timestamp should be valid")
}

pub fn user_model(id: Uuid, email: &str, password_hash: &str) -> user::Model {
    user::Model {
        id,
        created_at: ts(),
        updated_at: ts(),
        email: email.to_string(),
        password_hash: password_hash.to_string(),
        name: None,
        role_id: Uuid::new_v4(),
        login_attempts: 0,
        last_login_attempt: None,
        reset_token: None,
        reset_token_expiry: None,
    }
}

pub fn role_model(name: &str) -> role::Model {
    role::Model {
        id: Uuid::new_v4(),
        created_at: ts(),
        updated_at: ts(),
        name: name.to_string(),
        description: None,
    }
}

pub fn affiliate_model(user_id: Uuid, code: &str) -> affiliate::Model {
    affiliate::Model {
        id: Uuid::new_v4(),
        created_at: ts(),
        updated_at: ts(),
        code: code.to_string(),
        description: None,
        commission: 0.0,
        clicks: 0,
        user_id,
    }
}

pub fn media_model(name: &str) -> media::Model {
    let id = Uuid::new_v4();
    media::Model {
        id,
        created_at: ts(),
        updated_at: ts(),
        uuid: Uuid::new_v4(),
        name: name.to_string(),
        file_name: format!("{id}/image-1700000000000-000000001.png"),
        mime_type: "image/png".to_string(),
        disk: "local".to_string(),
        size: 4,
        collection_name: "Mặc định".to_string(),
        custom_properties: serde_json::json!({ "alt": "", "title": "" }),
        user_id: None,
    }
}

pub fn post_model(author_id: Uuid, title: &str, slug: &str) -> post::Model {
    post::Model {
        id: Uuid::new_v4(),
        created_at: ts(),
        updated_at: ts(),
        title: title.to_string(),
        slug: slug.to_string(),
        description: None,
        content: "content".to_string(),
        published: false,
        author_id,
    }
}

/// Defaults plus an auth section; rate limiting is off so tests do not
/// share counters.
pub fn test_config() -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.auth = Some(AuthConfig {
        provider: AuthProviderId::Local,
        jwt_secret: TEST_JWT_SECRET.to_string(),
        jwt_refresh_secret: TEST_REFRESH_SECRET.to_string(),
        access_ttl_minutes: 15,
        refresh_ttl_days: 7,
        reset_token_ttl_minutes: 60,
        admin_email: "admin@example.com".to_string(),
        admin_password: "Admin@123".to_string(),
    });
    cfg.security.rate_limit_enabled = false;
    cfg.security.csrf_enabled = Some(false);
    cfg
}

pub fn test_state(db: DatabaseConnection, cfg: AppConfig) -> Arc<AppState> {
    let services = ServiceContext::new(&db, &cfg);
    let providers = build_providers(&cfg, &services).expect("create auth providers");
    AppState::new(cfg, db, providers)
}

/// Full router with the error envelope layers `main` installs.
pub fn test_app(state: Arc<AppState>) -> Router {
    router(state)
        .layer(middleware::from_fn(json_error_middleware))
        .layer(catch_panic_layer())
}

pub fn bearer(user_id: Uuid, role: &str) -> String {
    let claims = make_claims(&user_id, "caller@example.com", role, 900);
    let token = encode_token(&JwtKeys::from_secret(TEST_JWT_SECRET.as_bytes()), &claims)
        .expect("token should encode");
    format!("Bearer {token}")
}
