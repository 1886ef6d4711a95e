use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

pub const ADMIN_ROLE: &str = "admin";
pub const DEFAULT_ROLE: &str = "user";

pub trait RequiredRole {
    fn required() -> &'static str;
    fn denied() -> &'static str;
}

pub struct AdminRole;

impl RequiredRole for AdminRole {
    fn required() -> &'static str {
        ADMIN_ROLE
    }

    fn denied() -> &'static str {
        "Admin access only"
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub role: String,
    pub iat: usize,
    pub exp: usize,
    /// Unique per token so two tokens minted in the same second still differ.
    pub jti: String,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.sub).map_err(|_| AppError::unauthorized("Invalid token subject"))
    }

    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenBundle {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_in: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub role: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    #[serde(flatten)]
    pub tokens: TokenBundle,
    pub user: SessionUser,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResetPasswordInput {
    pub email: String,
    pub token: String,
    pub new_password: String,
    pub confirm_password: String,
}

#[cfg(test)]
mod tests {
    use super::{AdminRole, Claims, RequiredRole};

    fn claims(sub: &str, role: &str) -> Claims {
        Claims {
            sub: sub.to_string(),
            email: "a@example.com".to_string(),
            role: role.to_string(),
            iat: 0,
            exp: 60,
            jti: "jti".to_string(),
        }
    }

    #[test]
    fn admin_marker_names_admin_role() {
        assert_eq!(AdminRole::required(), "admin");
        assert_eq!(AdminRole::denied(), "Admin access only");
    }

    #[test]
    fn user_id_rejects_malformed_subject() {
        let err = claims("not-a-uuid", "user")
            .user_id()
            .expect_err("subject should fail to parse");
        assert_eq!(err.message(), "Invalid token subject");

        let id = uuid::Uuid::new_v4();
        assert_eq!(claims(&id.to_string(), "admin").user_id().ok(), Some(id));
        assert!(claims(&id.to_string(), "admin").is_admin());
    }
}
