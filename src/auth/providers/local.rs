use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, Utc};
use rand::RngCore;
use uuid::Uuid;

use crate::{
    auth::{
        AuthSession, Claims, DEFAULT_ROLE, RegisterInput, ResetPasswordInput, SessionUser,
        TokenBundle, ADMIN_ROLE,
        jwt::{JwtKeys, decode_token, encode_token, make_claims},
        mailer::{LogMailer, Mailer},
        password::{
            ensure_passwords_match, hash_password, validate_password_strength, verify_password,
        },
    },
    config::AuthConfig,
    db::dao::{DaoBase, DaoContext, NewUser, RoleDao, TokenDao, TokenKind, UserDao},
    db::entities::user,
    error::AppError,
};

use super::{AuthProvider, AuthProviderId};

pub const MAX_LOGIN_ATTEMPTS: i32 = 5;
pub const LOCKOUT_MINUTES: i64 = 15;
const MAX_EMAIL_LEN: usize = 100;
const FORGOT_PASSWORD_MESSAGE: &str =
    "If an account with that email exists, a password reset link has been sent";

#[derive(Clone)]
pub struct LocalAuthSettings {
    pub access_keys: JwtKeys,
    pub refresh_keys: JwtKeys,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub reset_ttl: Duration,
    pub frontend_url: String,
}

impl LocalAuthSettings {
    pub fn from_config(cfg: &AuthConfig, frontend_url: &str) -> Self {
        Self {
            access_keys: JwtKeys::from_secret(cfg.jwt_secret.as_bytes()),
            refresh_keys: JwtKeys::from_secret(cfg.jwt_refresh_secret.as_bytes()),
            access_ttl: Duration::minutes(cfg.access_ttl_minutes),
            refresh_ttl: Duration::days(cfg.refresh_ttl_days),
            reset_ttl: Duration::minutes(cfg.reset_token_ttl_minutes),
            frontend_url: frontend_url.trim_end_matches('/').to_string(),
        }
    }
}

pub fn forgot_password_message() -> &'static str {
    FORGOT_PASSWORD_MESSAGE
}

/// Whole minutes left on a lockout, or `None` when the account may log in.
pub fn lockout_remaining(
    attempts: i32,
    last_attempt: Option<DateTime<FixedOffset>>,
    now: DateTime<FixedOffset>,
) -> Option<i64> {
    if attempts < MAX_LOGIN_ATTEMPTS {
        return None;
    }
    let elapsed = (now - last_attempt?).num_minutes();
    (elapsed < LOCKOUT_MINUTES).then(|| LOCKOUT_MINUTES - elapsed)
}

pub(crate) fn validate_email(email: &str) -> Result<(), AppError> {
    let valid = email.len() <= MAX_EMAIL_LEN
        && email
            .split_once('@')
            .is_some_and(|(local, domain)| {
                !local.is_empty() && !domain.is_empty() && !domain.contains('@')
            });
    if valid {
        Ok(())
    } else {
        Err(AppError::bad_request("Email must be a valid email address"))
    }
}

fn random_reset_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn invalid_refresh() -> AppError {
    AppError::unauthorized("Invalid refresh token")
}

#[derive(Clone)]
pub struct LocalAuthProvider {
    users: UserDao,
    roles: RoleDao,
    tokens: TokenDao,
    settings: LocalAuthSettings,
    mailer: Arc<dyn Mailer>,
}

impl LocalAuthProvider {
    pub fn new(daos: &DaoContext, settings: LocalAuthSettings) -> Self {
        Self {
            users: daos.user(),
            roles: daos.role(),
            tokens: daos.token(),
            settings,
            mailer: Arc::new(LogMailer),
        }
    }

    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = mailer;
        self
    }

    fn reset_link(&self, token: &str, email: &str) -> Result<String, AppError> {
        let base = format!("{}/reset-password", self.settings.frontend_url);
        url::Url::parse_with_params(&base, &[("token", token), ("email", email)])
            .map(String::from)
            .map_err(|err| AppError::internal_with_source("invalid frontend url", err))
    }

    async fn role_name(&self, role_id: Uuid) -> Result<String, AppError> {
        Ok(self
            .roles
            .try_find_by_id(role_id)
            .await?
            .map(|role| role.name)
            .unwrap_or_else(|| DEFAULT_ROLE.to_string()))
    }

    async fn issue_tokens(&self, user: &user::Model) -> Result<AuthSession, AppError> {
        let role = self.role_name(user.role_id).await?;
        let access_secs = self.settings.access_ttl.num_seconds().max(0) as usize;
        let refresh_secs = self.settings.refresh_ttl.num_seconds().max(0) as usize;

        let access_claims = make_claims(&user.id, &user.email, &role, access_secs);
        let refresh_claims = make_claims(&user.id, &user.email, &role, refresh_secs);
        let access_token = encode_token(&self.settings.access_keys, &access_claims)?;
        let refresh_token = encode_token(&self.settings.refresh_keys, &refresh_claims)?;

        let now = Utc::now().fixed_offset();
        self.tokens
            .store(
                user.id,
                &access_token,
                TokenKind::Access,
                now + self.settings.access_ttl,
            )
            .await?;
        self.tokens
            .store(
                user.id,
                &refresh_token,
                TokenKind::Refresh,
                now + self.settings.refresh_ttl,
            )
            .await?;

        Ok(AuthSession {
            tokens: TokenBundle {
                access_token,
                refresh_token,
                token_type: "Bearer",
                expires_in: access_secs,
            },
            user: SessionUser {
                id: user.id,
                email: user.email.clone(),
                name: user.name.clone(),
                role,
            },
        })
    }
}

#[async_trait]
impl AuthProvider for LocalAuthProvider {
    fn id(&self) -> AuthProviderId {
        AuthProviderId::Local
    }

    #[tracing::instrument(skip_all, fields(email = %input.email))]
    async fn register(&self, input: RegisterInput) -> Result<AuthSession, AppError> {
        let email = input.email.trim().to_string();
        validate_email(&email)?;
        validate_password_strength(&input.password)?;
        ensure_passwords_match(&input.password, &input.confirm_password)?;

        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AppError::conflict("Email already exists"));
        }

        let role = self
            .roles
            .find_by_name(DEFAULT_ROLE)
            .await?
            .ok_or_else(|| AppError::conflict(format!("Default role \"{DEFAULT_ROLE}\" not found")))?;

        let password_hash = hash_password(&input.password)?;
        let name = input
            .name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());
        let user = self
            .users
            .create_user(NewUser {
                email,
                password_hash,
                name,
                role_id: role.id,
            })
            .await?;

        self.issue_tokens(&user).await
    }

    #[tracing::instrument(skip(self, password))]
    async fn login(&self, email: &str, password: &str) -> Result<AuthSession, AppError> {
        let user = self
            .users
            .find_by_email(email.trim())
            .await?
            .ok_or_else(|| AppError::unauthorized("Invalid credentials"))?;

        let now = Utc::now().fixed_offset();
        if let Some(minutes) = lockout_remaining(user.login_attempts, user.last_login_attempt, now)
        {
            return Err(AppError::unauthorized(format!(
                "Account locked. Please try again in {minutes} minutes"
            )));
        }
        // A lapsed lockout starts counting from zero again.
        let attempts = if user.login_attempts >= MAX_LOGIN_ATTEMPTS {
            0
        } else {
            user.login_attempts
        };

        if !verify_password(password, &user.password_hash)? {
            self.users
                .record_failed_login(user, attempts + 1, now)
                .await?;
            return Err(AppError::unauthorized("Invalid credentials"));
        }

        let user = self.users.record_successful_login(user, now).await?;
        self.issue_tokens(&user).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthSession, AppError> {
        decode_token(&self.settings.refresh_keys, refresh_token).map_err(|_| invalid_refresh())?;

        let now = Utc::now().fixed_offset();
        let stored = self
            .tokens
            .find_live(refresh_token, TokenKind::Refresh, now)
            .await?
            .ok_or_else(invalid_refresh)?;
        let user = self
            .users
            .try_find_by_id(stored.user_id)
            .await?
            .ok_or_else(invalid_refresh)?;

        self.tokens.delete(stored.id).await?;
        self.issue_tokens(&user).await
    }

    async fn logout(&self, user_id: Uuid) -> Result<(), AppError> {
        let removed = self.tokens.delete_for_user(user_id).await?;
        tracing::debug!(%user_id, removed, "tokens revoked");
        Ok(())
    }

    async fn verify(&self, access_token: &str) -> Result<Claims, AppError> {
        Ok(decode_token(&self.settings.access_keys, access_token)?)
    }

    #[tracing::instrument(skip(self))]
    async fn forgot_password(&self, email: &str) -> Result<(), AppError> {
        let Some(user) = self.users.find_by_email(email.trim()).await? else {
            return Ok(());
        };

        let token = random_reset_token();
        let expiry = Utc::now().fixed_offset() + self.settings.reset_ttl;
        let link = self.reset_link(&token, &user.email)?;
        let user = self.users.set_reset_token(user, token, expiry).await?;

        if let Err(err) = self.mailer.send_password_reset(&user.email, &link).await {
            tracing::error!(error = %err, "failed to send password reset mail");
        }
        Ok(())
    }

    async fn reset_password(&self, input: ResetPasswordInput) -> Result<(), AppError> {
        validate_password_strength(&input.new_password)?;
        ensure_passwords_match(&input.new_password, &input.confirm_password)?;

        let invalid = || AppError::bad_request("Invalid or expired reset token");
        let user = self
            .users
            .find_by_email(input.email.trim())
            .await?
            .ok_or_else(invalid)?;

        let now = Utc::now().fixed_offset();
        let token_ok = user.reset_token.as_deref() == Some(input.token.as_str());
        let fresh = user.reset_token_expiry.is_some_and(|expiry| expiry > now);
        if !token_ok || !fresh {
            return Err(invalid());
        }

        let password_hash = hash_password(&input.new_password)?;
        let user = self.users.complete_password_reset(user, password_hash).await?;
        self.tokens.delete_for_user(user.id).await?;
        Ok(())
    }

    async fn seed_admin(&self, cfg: &AuthConfig) -> anyhow::Result<()> {
        if let Some(existing) = self.users.find_by_email(&cfg.admin_email).await? {
            tracing::info!("admin user already present: {}", existing.email);
            return Ok(());
        }

        let role = self
            .roles
            .find_by_name(ADMIN_ROLE)
            .await?
            .ok_or_else(|| anyhow::anyhow!("admin role missing; seed roles first"))?;
        let password_hash = hash_password(&cfg.admin_password)
            .map_err(|err| anyhow::anyhow!("admin seed hash error: {err}"))?;
        let user = self
            .users
            .create_user(NewUser {
                email: cfg.admin_email.clone(),
                password_hash,
                name: Some("Administrator".to_string()),
                role_id: role.id,
            })
            .await?;
        tracing::info!("seeded admin user {}", user.email);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use sea_orm::{DatabaseBackend, IntoMockRow, MockDatabase, MockExecResult};
    use uuid::Uuid;

    use super::{LocalAuthProvider, LocalAuthSettings, lockout_remaining};
    use crate::{
        auth::{
            RegisterInput, ResetPasswordInput,
            jwt::{JwtKeys, encode_token, make_claims},
            mailer::Mailer,
            password::hash_password,
            providers::{AuthProvider, AuthProviderId},
        },
        db::dao::DaoContext,
        db::entities::{role, token, user},
        test_helpers::{role_model, ts, user_model},
    };

    const ACCESS_SECRET: &[u8] = b"access-secret";
    const REFRESH_SECRET: &[u8] = b"refresh-secret";

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send_password_reset(&self, to: &str, reset_link: &str) -> anyhow::Result<()> {
            if let Ok(mut sent) = self.sent.lock() {
                sent.push((to.to_string(), reset_link.to_string()));
            }
            Ok(())
        }
    }

    struct ProviderFixtureBuilder {
        mock: MockDatabase,
        mailer: Arc<RecordingMailer>,
    }

    impl ProviderFixtureBuilder {
        fn new() -> Self {
            Self {
                mock: MockDatabase::new(DatabaseBackend::Postgres),
                mailer: Arc::new(RecordingMailer::default()),
            }
        }

        fn with_query_results<T, I, II>(mut self, sets: II) -> Self
        where
            T: IntoMockRow,
            I: IntoIterator<Item = T>,
            II: IntoIterator<Item = I>,
        {
            self.mock = self.mock.append_query_results(sets);
            self
        }

        fn with_exec_result(mut self, rows_affected: u64) -> Self {
            self.mock = self.mock.append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected,
            }]);
            self
        }

        /// Two inserts: access then refresh copy.
        fn with_issued_tokens(self, user_id: Uuid) -> Self {
            self.with_query_results([[token_row(user_id, "access")]])
                .with_query_results([[token_row(user_id, "refresh")]])
        }

        fn build(self) -> (LocalAuthProvider, Arc<RecordingMailer>) {
            let db = self.mock.into_connection();
            let settings = LocalAuthSettings {
                access_keys: JwtKeys::from_secret(ACCESS_SECRET),
                refresh_keys: JwtKeys::from_secret(REFRESH_SECRET),
                access_ttl: Duration::minutes(15),
                refresh_ttl: Duration::days(7),
                reset_ttl: Duration::minutes(60),
                frontend_url: "http://front.test".to_string(),
            };
            let mailer = Arc::clone(&self.mailer);
            let provider =
                LocalAuthProvider::new(&DaoContext::new(&db), settings).with_mailer(mailer.clone());
            (provider, mailer)
        }
    }

    fn token_row(user_id: Uuid, kind: &str) -> token::Model {
        token::Model {
            id: Uuid::new_v4(),
            created_at: ts(),
            updated_at: ts(),
            user_id,
            token: "stored".to_string(),
            kind: kind.to_string(),
            expires_at: Utc::now().fixed_offset() + Duration::days(7),
        }
    }

    fn register_input(password: &str, confirm: &str) -> RegisterInput {
        RegisterInput {
            email: "alice@example.com".to_string(),
            password: password.to_string(),
            confirm_password: confirm.to_string(),
            name: Some("Alice".to_string()),
        }
    }

    #[test]
    fn lockout_counts_down_from_last_attempt() {
        let now = ts();
        assert_eq!(lockout_remaining(4, Some(now), now), None);
        assert_eq!(lockout_remaining(5, Some(now - Duration::minutes(3)), now), Some(12));
        assert_eq!(lockout_remaining(7, Some(now - Duration::minutes(15)), now), None);
        assert_eq!(lockout_remaining(5, None, now), None);
    }

    #[tokio::test]
    async fn provider_id_is_local() {
        let (provider, _) = ProviderFixtureBuilder::new().build();
        assert_eq!(provider.id(), AuthProviderId::Local);
    }

    #[tokio::test]
    async fn register_enforces_password_policy_before_queries() {
        let (provider, _) = ProviderFixtureBuilder::new().build();

        let err = provider
            .register(register_input("password123", "password123"))
            .await
            .expect_err("weak password should fail");
        assert_eq!(
            err.message(),
            "Password must contain at least one uppercase letter, one lowercase letter, one number and one special character"
        );

        let err = provider
            .register(register_input("Str0ng!pass", "Str0ng!other"))
            .await
            .expect_err("mismatch should fail");
        assert_eq!(err.message(), "Passwords do not match");
    }

    #[tokio::test]
    async fn register_rejects_existing_email() {
        let (provider, _) = ProviderFixtureBuilder::new()
            .with_query_results([[user_model(Uuid::new_v4(), "alice@example.com", "hash")]])
            .build();

        let err = provider
            .register(register_input("Str0ng!pass", "Str0ng!pass"))
            .await
            .expect_err("register should fail");
        assert_eq!(err.message(), "Email already exists");
    }

    #[tokio::test]
    async fn register_requires_default_role() {
        let (provider, _) = ProviderFixtureBuilder::new()
            .with_query_results([Vec::<user::Model>::new()])
            .with_query_results([Vec::<role::Model>::new()])
            .build();

        let err = provider
            .register(register_input("Str0ng!pass", "Str0ng!pass"))
            .await
            .expect_err("register should fail");
        assert_eq!(err.message(), "Default role \"user\" not found");
    }

    #[tokio::test]
    async fn register_issues_session_with_role_claim() {
        let user_id = Uuid::new_v4();
        let role = role_model("user");
        let (provider, _) = ProviderFixtureBuilder::new()
            .with_query_results([Vec::<user::Model>::new()])
            .with_query_results([[role.clone()]])
            .with_query_results([[user_model(user_id, "alice@example.com", "hash")]])
            .with_query_results([[role]])
            .with_issued_tokens(user_id)
            .build();

        let session = provider
            .register(register_input("Str0ng!pass", "Str0ng!pass"))
            .await
            .expect("register should succeed");

        assert_eq!(session.tokens.token_type, "Bearer");
        assert_eq!(session.tokens.expires_in, 15 * 60);
        assert_eq!(session.user.role, "user");
        let claims = provider
            .verify(&session.tokens.access_token)
            .await
            .expect("access token should verify");
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.role, "user");
        assert!(
            provider.verify(&session.tokens.refresh_token).await.is_err(),
            "refresh token must not pass as access token"
        );
    }

    #[tokio::test]
    async fn login_rejects_unknown_email() {
        let (provider, _) = ProviderFixtureBuilder::new()
            .with_query_results([Vec::<user::Model>::new()])
            .build();

        let err = provider
            .login("ghost@example.com", "Str0ng!pass")
            .await
            .expect_err("login should fail");
        assert_eq!(err.message(), "Invalid credentials");
    }

    #[tokio::test]
    async fn login_reports_lockout_minutes() {
        let mut locked = user_model(Uuid::new_v4(), "alice@example.com", "hash");
        locked.login_attempts = 5;
        locked.last_login_attempt = Some(Utc::now().fixed_offset() - Duration::seconds(30));
        let (provider, _) = ProviderFixtureBuilder::new()
            .with_query_results([[locked]])
            .build();

        let err = provider
            .login("alice@example.com", "Str0ng!pass")
            .await
            .expect_err("locked account should fail");
        assert_eq!(err.message(), "Account locked. Please try again in 15 minutes");
    }

    #[tokio::test]
    async fn wrong_password_counts_attempt() {
        let hash = hash_password("Str0ng!pass").expect("hash should succeed");
        let stored = user_model(Uuid::new_v4(), "alice@example.com", &hash);
        let mut bumped = stored.clone();
        bumped.login_attempts = 1;
        let (provider, _) = ProviderFixtureBuilder::new()
            .with_query_results([[stored]])
            .with_query_results([[bumped]])
            .build();

        let err = provider
            .login("alice@example.com", "Wr0ng!pass")
            .await
            .expect_err("login should fail");
        assert_eq!(err.message(), "Invalid credentials");
    }

    #[tokio::test]
    async fn login_returns_session_on_success() {
        let user_id = Uuid::new_v4();
        let hash = hash_password("Str0ng!pass").expect("hash should succeed");
        let stored = user_model(user_id, "alice@example.com", &hash);
        let (provider, _) = ProviderFixtureBuilder::new()
            .with_query_results([[stored.clone()]])
            .with_query_results([[stored]])
            .with_query_results([[role_model("editor")]])
            .with_issued_tokens(user_id)
            .build();

        let session = provider
            .login("alice@example.com", "Str0ng!pass")
            .await
            .expect("login should succeed");
        assert_eq!(session.user.id, user_id);
        assert_eq!(session.user.role, "editor");
    }

    #[tokio::test]
    async fn refresh_rejects_token_signed_with_access_secret() {
        let (provider, _) = ProviderFixtureBuilder::new().build();
        let claims = make_claims(&Uuid::new_v4(), "alice@example.com", "user", 600);
        let token = encode_token(&JwtKeys::from_secret(ACCESS_SECRET), &claims)
            .expect("token should encode");

        let err = provider.refresh(&token).await.expect_err("refresh should fail");
        assert_eq!(err.message(), "Invalid refresh token");
    }

    #[tokio::test]
    async fn refresh_requires_persisted_row() {
        let claims = make_claims(&Uuid::new_v4(), "alice@example.com", "user", 600);
        let token = encode_token(&JwtKeys::from_secret(REFRESH_SECRET), &claims)
            .expect("token should encode");
        let (provider, _) = ProviderFixtureBuilder::new()
            .with_query_results([Vec::<token::Model>::new()])
            .build();

        let err = provider.refresh(&token).await.expect_err("refresh should fail");
        assert_eq!(err.message(), "Invalid refresh token");
    }

    #[tokio::test]
    async fn refresh_rotates_tokens() {
        let user_id = Uuid::new_v4();
        let claims = make_claims(&user_id, "alice@example.com", "user", 600);
        let token = encode_token(&JwtKeys::from_secret(REFRESH_SECRET), &claims)
            .expect("token should encode");
        let (provider, _) = ProviderFixtureBuilder::new()
            .with_query_results([[token_row(user_id, "refresh")]])
            .with_query_results([[user_model(user_id, "alice@example.com", "hash")]])
            .with_exec_result(1)
            .with_query_results([[role_model("user")]])
            .with_issued_tokens(user_id)
            .build();

        let session = provider.refresh(&token).await.expect("refresh should succeed");
        assert_ne!(session.tokens.refresh_token, token);
    }

    #[tokio::test]
    async fn forgot_password_is_silent_for_unknown_email() {
        let (provider, mailer) = ProviderFixtureBuilder::new()
            .with_query_results([Vec::<user::Model>::new()])
            .build();

        provider
            .forgot_password("ghost@example.com")
            .await
            .expect("unknown email should not fail");
        assert!(mailer.sent.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn forgot_password_mails_reset_link() {
        let stored = user_model(Uuid::new_v4(), "alice@example.com", "hash");
        let (provider, mailer) = ProviderFixtureBuilder::new()
            .with_query_results([[stored.clone()]])
            .with_query_results([[stored]])
            .build();

        provider
            .forgot_password("alice@example.com")
            .await
            .expect("forgot password should succeed");

        let sent = mailer.sent.lock().expect("lock");
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "alice@example.com");
        assert!(sent[0].1.starts_with("http://front.test/reset-password?token="));
        assert!(sent[0].1.ends_with("&email=alice%40example.com"));
    }

    #[tokio::test]
    async fn reset_password_rejects_expired_token() {
        let mut stored = user_model(Uuid::new_v4(), "alice@example.com", "hash");
        stored.reset_token = Some("abc".to_string());
        stored.reset_token_expiry = Some(Utc::now().fixed_offset() - Duration::minutes(1));
        let (provider, _) = ProviderFixtureBuilder::new()
            .with_query_results([[stored]])
            .build();

        let err = provider
            .reset_password(ResetPasswordInput {
                email: "alice@example.com".to_string(),
                token: "abc".to_string(),
                new_password: "N3w!password".to_string(),
                confirm_password: "N3w!password".to_string(),
            })
            .await
            .expect_err("expired token should fail");
        assert_eq!(err.message(), "Invalid or expired reset token");
    }

    #[tokio::test]
    async fn reset_password_revokes_sessions() {
        let user_id = Uuid::new_v4();
        let mut stored = user_model(user_id, "alice@example.com", "hash");
        stored.reset_token = Some("abc".to_string());
        stored.reset_token_expiry = Some(Utc::now().fixed_offset() + Duration::minutes(30));
        let (provider, _) = ProviderFixtureBuilder::new()
            .with_query_results([[stored.clone()]])
            .with_query_results([[user_model(user_id, "alice@example.com", "new-hash")]])
            .with_exec_result(2)
            .build();

        provider
            .reset_password(ResetPasswordInput {
                email: "alice@example.com".to_string(),
                token: "abc".to_string(),
                new_password: "N3w!password".to_string(),
                confirm_password: "N3w!password".to_string(),
            })
            .await
            .expect("reset should succeed");
    }
}
