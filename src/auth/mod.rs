pub mod bootstrap;
pub mod jwt;
pub mod mailer;
pub mod password;
pub mod providers;
mod types;

pub use types::{
    ADMIN_ROLE, AdminRole, AuthSession, Claims, DEFAULT_ROLE, RegisterInput, RequiredRole,
    ResetPasswordInput, SessionUser, TokenBundle,
};
