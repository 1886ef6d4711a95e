use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use super::Claims;
use crate::error::AppError;

#[derive(Clone)]
pub struct JwtKeys {
    pub enc: EncodingKey,
    pub dec: DecodingKey,
}

impl JwtKeys {
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            enc: EncodingKey::from_secret(secret),
            dec: DecodingKey::from_secret(secret),
        }
    }
}

pub fn now_unix() -> usize {
    Utc::now().timestamp().max(0) as usize
}

pub fn encode_token(keys: &JwtKeys, claims: &Claims) -> Result<String, AppError> {
    let mut header = Header::new(Algorithm::HS256);
    header.typ = Some("JWT".into());

    encode(&header, claims, &keys.enc)
        .map_err(|err| AppError::internal_with_source("token encoding failed", err))
}

/// Signature and expiry are both checked.
pub fn decode_token(keys: &JwtKeys, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.leeway = 0;
    decode::<Claims>(token, &keys.dec, &validation).map(|data| data.claims)
}

pub fn make_claims(user_id: &Uuid, email: &str, role: &str, ttl_secs: usize) -> Claims {
    let iat = now_unix();
    Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        role: role.to_string(),
        iat,
        exp: iat + ttl_secs,
        jti: Uuid::new_v4().to_string(),
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(_: jsonwebtoken::errors::Error) -> Self {
        AppError::unauthorized("Invalid or expired token")
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::{JwtKeys, decode_token, encode_token, make_claims};
    use crate::error::AppError;

    #[test]
    fn makes_claims_with_expected_subject_role_and_ttl() {
        let user_id = Uuid::new_v4();
        let claims = make_claims(&user_id, "a@example.com", "editor", 60);

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.role, "editor");
        assert_eq!(claims.exp.saturating_sub(claims.iat), 60);
    }

    #[test]
    fn two_tokens_for_same_user_differ() {
        let keys = JwtKeys::from_secret(b"unit-test-secret");
        let user_id = Uuid::new_v4();
        let first = encode_token(&keys, &make_claims(&user_id, "a@example.com", "user", 60))
            .expect("token should encode");
        let second = encode_token(&keys, &make_claims(&user_id, "a@example.com", "user", 60))
            .expect("token should encode");

        assert_ne!(first, second);
    }

    #[test]
    fn decodes_with_same_secret_only() {
        let keys = JwtKeys::from_secret(b"access-secret");
        let claims = make_claims(&Uuid::new_v4(), "a@example.com", "admin", 600);
        let token = encode_token(&keys, &claims).expect("token should encode");

        let decoded = decode_token(&keys, &token).expect("token should decode");
        assert_eq!(decoded, claims);

        let err = decode_token(&JwtKeys::from_secret(b"refresh-secret"), &token)
            .expect_err("foreign secret should fail");
        assert_eq!(AppError::from(err).message(), "Invalid or expired token");
    }

    #[test]
    fn rejects_expired_token() {
        let keys = JwtKeys::from_secret(b"access-secret");
        let mut claims = make_claims(&Uuid::new_v4(), "a@example.com", "user", 0);
        claims.exp = claims.iat.saturating_sub(10);
        let token = encode_token(&keys, &claims).expect("token should encode");

        assert!(decode_token(&keys, &token).is_err());
    }
}
