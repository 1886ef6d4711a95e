use uuid::Uuid;

use crate::{
    auth::{
        AuthSession, Claims, RegisterInput, ResetPasswordInput, providers::AuthProviders,
        providers::local::forgot_password_message,
    },
    config::AuthConfig,
    error::AppError,
};

#[derive(Clone, Copy)]
pub struct AuthService<'a> {
    providers: &'a AuthProviders,
}

impl<'a> AuthService<'a> {
    pub fn new(providers: &'a AuthProviders) -> Self {
        Self { providers }
    }

    pub async fn register(&self, input: RegisterInput) -> Result<AuthSession, AppError> {
        self.providers.active()?.register(input).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, AppError> {
        self.providers.active()?.login(email, password).await
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthSession, AppError> {
        self.providers.active()?.refresh(refresh_token).await
    }

    pub async fn logout(&self, user_id: Uuid) -> Result<(), AppError> {
        self.providers.active()?.logout(user_id).await
    }

    pub async fn verify(&self, access_token: &str) -> Result<Claims, AppError> {
        self.providers.active()?.verify(access_token).await
    }

    /// Always yields the same message so callers cannot probe for accounts.
    pub async fn forgot_password(&self, email: &str) -> Result<&'static str, AppError> {
        self.providers.active()?.forgot_password(email).await?;
        Ok(forgot_password_message())
    }

    pub async fn reset_password(&self, input: ResetPasswordInput) -> Result<(), AppError> {
        self.providers.active()?.reset_password(input).await
    }

    pub async fn seed_admin(&self, cfg: &AuthConfig) -> anyhow::Result<()> {
        self.providers
            .active()
            .map_err(|err| anyhow::anyhow!(err.to_string()))?
            .seed_admin(cfg)
            .await
    }
}
