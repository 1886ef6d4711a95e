use std::sync::Arc;

use crate::{
    config::AppConfig, db::seed::seed_roles_and_permissions, error::AppError,
    services::ServiceContext,
};

use super::providers::{AuthProviders, LocalAuthProvider, LocalAuthSettings};

pub fn build_providers(
    cfg: &AppConfig,
    services: &ServiceContext,
) -> Result<AuthProviders, AppError> {
    let auth = cfg
        .auth
        .as_ref()
        .ok_or_else(|| AppError::internal("auth config missing"))?;
    let settings = LocalAuthSettings::from_config(auth, &cfg.general.frontend_url);
    let local_provider = LocalAuthProvider::new(services.daos(), settings);
    let mut providers =
        AuthProviders::new(auth.provider).with_provider(Arc::new(local_provider))?;
    providers.set_active(auth.provider)?;
    Ok(providers)
}

/// Seeds roles, permissions and the admin account, then returns the registry.
pub async fn init_providers(
    cfg: &AppConfig,
    services: &ServiceContext,
) -> anyhow::Result<AuthProviders> {
    let providers = build_providers(cfg, services)?;
    seed_roles_and_permissions(services.daos().db()).await?;
    if let Some(auth) = cfg.auth.as_ref() {
        services.auth(&providers).seed_admin(auth).await?;
    }
    Ok(providers)
}
