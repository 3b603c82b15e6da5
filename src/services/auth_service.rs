// src/services/auth_service.rs
// DOCUMENTATION: Password hashing and bearer token handling
// PURPOSE: argon2 hashes for stored passwords, HS256 JWTs for sessions

use crate::config::Config;
use crate::errors::AppError;
use crate::models::Role;
use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// User id
    pub sub: Uuid,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

pub struct AuthService;

impl AuthService {
    /// Hash a plaintext password into a PHC string
    pub fn hash_password(password: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| {
                log::error!("Password hashing failed: {}", e);
                AppError::InternalError
            })
    }

    /// Check a plaintext password against a stored PHC string
    /// A malformed stored hash counts as a mismatch
    pub fn verify_password(password: &str, stored_hash: &str) -> bool {
        match PasswordHash::new(stored_hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                log::warn!("Stored password hash could not be parsed: {}", e);
                false
            }
        }
    }

    /// Issue a signed token for a user
    pub fn issue_token(config: &Config, user_id: Uuid, role: Role) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            role,
            iat: now.timestamp(),
            exp: (now + Duration::hours(config.jwt_expires_in_hours)).timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )
        .map_err(|e| {
            log::error!("Token signing failed: {}", e);
            AppError::InternalError
        })
    }

    /// Verify signature and expiry, returning the claims
    pub fn decode_token(config: &Config, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| {
            log::debug!("Rejected bearer token: {}", e);
            AppError::Unauthorized("Not authorized to access this route".to_string())
        })
    }

    /// Pull the token out of an `Authorization: Bearer <token>` header value
    pub fn bearer_token(header_value: &str) -> Option<&str> {
        let (scheme, token) = header_value.trim().split_once(' ')?;
        let token = token.trim();
        if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
            Some(token)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_round_trip() {
        let hash = AuthService::hash_password("correct horse battery").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(AuthService::verify_password("correct horse battery", &hash));
        assert!(!AuthService::verify_password("wrong password", &hash));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = AuthService::hash_password("same-password").unwrap();
        let b = AuthService::hash_password("same-password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_garbage_hash_never_verifies() {
        assert!(!AuthService::verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn test_token_round_trip() {
        let config = Config::for_tests();
        let user_id = Uuid::new_v4();
        let token = AuthService::issue_token(&config, user_id, Role::Agent).unwrap();

        let claims = AuthService::decode_token(&config, &token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role, Role::Agent);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let config = Config::for_tests();
        let mut other = Config::for_tests();
        other.jwt_secret = "someone-else".to_string();

        let token = AuthService::issue_token(&other, Uuid::new_v4(), Role::User).unwrap();
        let err = AuthService::decode_token(&config, &token).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let config = Config::for_tests();
        let claims = Claims {
            sub: Uuid::new_v4(),
            role: Role::User,
            iat: Utc::now().timestamp() - 7200,
            exp: Utc::now().timestamp() - 3600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )
        .unwrap();

        assert!(AuthService::decode_token(&config, &token).is_err());
    }

    #[test]
    fn test_bearer_parsing() {
        assert_eq!(AuthService::bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(AuthService::bearer_token("bearer   abc"), Some("abc"));
        assert_eq!(AuthService::bearer_token("Basic abc"), None);
        assert_eq!(AuthService::bearer_token("Bearer "), None);
        assert_eq!(AuthService::bearer_token("abc"), None);
    }
}
