use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{auth::providers::AuthProviders, config::AppConfig, middleware::RateLimiters};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: DatabaseConnection,
    pub auth_providers: AuthProviders,
    pub rate_limiters: RateLimiters,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        db: DatabaseConnection,
        auth_providers: AuthProviders,
    ) -> Arc<Self> {
        let rate_limiters = RateLimiters::from_config(&config.security);
        Arc::new(Self {
            db,
            config,
            auth_providers,
            rate_limiters,
        })
    }
}
