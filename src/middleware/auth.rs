// src/middleware/auth.rs
// DOCUMENTATION: Bearer token authentication as actix extractors
// PURPOSE: `AuthUser` in a handler signature means the route is protected;
// `OptionalAuthUser` attaches the caller when a token is sent

use crate::config::Config;
use crate::db::UserRepository;
use crate::errors::AppError;
use crate::models::User;
use crate::services::AuthService;
use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;
use sqlx::PgPool;
use std::ops::Deref;

/// Authenticated, active account loaded from the database
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

/// Caller when a bearer token is present, None otherwise
#[derive(Debug, Clone)]
pub struct OptionalAuthUser(pub Option<User>);

impl Deref for AuthUser {
    type Target = User;

    fn deref(&self) -> &User {
        &self.0
    }
}

impl AuthUser {
    pub fn into_inner(self) -> User {
        self.0
    }
}

fn not_authorized() -> AppError {
    AppError::Unauthorized("Not authorized to access this route".to_string())
}

/// Token from the Authorization header
/// Ok(None) when the header is absent, 401 when it is present but malformed
pub fn bearer_from_request(req: &HttpRequest) -> Result<Option<String>, AppError> {
    let header = match req.headers().get(AUTHORIZATION) {
        Some(header) => header,
        None => return Ok(None),
    };

    let value = header.to_str().map_err(|_| not_authorized())?;
    AuthService::bearer_token(value)
        .map(|token| Some(token.to_string()))
        .ok_or_else(not_authorized)
}

/// Address used to key the auth rate limiter
pub fn client_ip(req: &HttpRequest) -> String {
    req.connection_info()
        .realip_remote_addr()
        .unwrap_or("unknown")
        .to_string()
}

async fn load_user(req: &HttpRequest, token: &str) -> Result<User, AppError> {
    let config = req.app_data::<web::Data<Config>>().ok_or_else(|| {
        log::error!("Config missing from app data");
        AppError::InternalError
    })?;
    let pool = req.app_data::<web::Data<PgPool>>().ok_or_else(|| {
        log::error!("Database pool missing from app data");
        AppError::InternalError
    })?;

    let claims = AuthService::decode_token(config, token)?;
    let user = UserRepository::find_by_id(pool.get_ref(), claims.sub)
        .await?
        .ok_or_else(|| {
            log::warn!("Token for unknown user {}", claims.sub);
            not_authorized()
        })?;

    if !user.is_active {
        log::warn!("Deactivated user {} presented a token", user.id);
        return Err(AppError::Forbidden("Account is deactivated".to_string()));
    }

    Ok(user)
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            let token = bearer_from_request(&req)?.ok_or_else(not_authorized)?;
            load_user(&req, &token).await.map(AuthUser)
        })
    }
}

impl FromRequest for OptionalAuthUser {
    type Error = AppError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            match bearer_from_request(&req)? {
                Some(token) => load_user(&req, &token).await.map(|u| OptionalAuthUser(Some(u))),
                None => Ok(OptionalAuthUser(None)),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_bearer_from_request() {
        let req = TestRequest::default()
            .insert_header((AUTHORIZATION, "Bearer abc.def.ghi"))
            .to_http_request();
        assert_eq!(bearer_from_request(&req).unwrap().as_deref(), Some("abc.def.ghi"));

        let anonymous = TestRequest::default().to_http_request();
        assert_eq!(bearer_from_request(&anonymous).unwrap(), None);

        let basic = TestRequest::default()
            .insert_header((AUTHORIZATION, "Basic dXNlcjpwYXNz"))
            .to_http_request();
        assert!(matches!(
            bearer_from_request(&basic),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[actix_rt::test]
    async fn test_missing_token_is_unauthorized() {
        let req = TestRequest::default().to_http_request();
        let result = AuthUser::extract(&req).await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[actix_rt::test]
    async fn test_optional_user_without_header() {
        let req = TestRequest::default().to_http_request();
        let OptionalAuthUser(user) = OptionalAuthUser::extract(&req).await.unwrap();
        assert!(user.is_none());
    }

    #[actix_rt::test]
    async fn test_invalid_token_is_rejected_before_db_lookup() {
        let req = TestRequest::default()
            .insert_header((AUTHORIZATION, "Bearer not-a-jwt"))
            .app_data(web::Data::new(Config::for_tests()))
            .app_data(web::Data::new(
                sqlx::postgres::PgPoolOptions::new()
                    .connect_lazy("postgresql://localhost/realty_test")
                    .unwrap(),
            ))
            .to_http_request();

        let result = OptionalAuthUser::extract(&req).await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_client_ip_prefers_forwarded_header() {
        let req = TestRequest::default()
            .insert_header(("X-Forwarded-For", "203.0.113.7"))
            .to_http_request();
        assert_eq!(client_ip(&req), "203.0.113.7");
    }
}
