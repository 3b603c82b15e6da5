// src/handlers/auth.rs
// DOCUMENTATION: HTTP handlers for accounts and sessions
// PURPOSE: Register, login, profile and password endpoints

use crate::config::Config;
use crate::db::{NewUser, UserRepository, UserTypeRepository};
use crate::errors::AppError;
use crate::middleware::{client_ip, AuthUser};
use crate::models::{
    ApiResponse, AuthResponse, ChangePasswordRequest, EntityType, LoginRequest, RegisterRequest,
    Role, UpdateProfileRequest,
};
use crate::services::{AuthRateLimiter, AuthService, DynamicFieldService};
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use sqlx::PgPool;
use validator::Validate;

/// POST /auth/register
/// Create an account and return a session token
pub async fn register(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    limiter: web::Data<AuthRateLimiter>,
    http_req: HttpRequest,
    body: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    limiter.check(&client_ip(&http_req))?;
    body.validate()?;
    let req = body.into_inner();

    let role = req.role.unwrap_or(Role::User);
    if role == Role::Admin {
        return Err(AppError::InvalidInput(
            "Admin accounts cannot be self-registered".to_string(),
        ));
    }

    if UserRepository::find_by_email(pool.get_ref(), &req.email)
        .await?
        .is_some()
    {
        return Err(AppError::AlreadyExists(
            "Email is already registered".to_string(),
        ));
    }

    if let Some(type_id) = req.user_type_id {
        UserTypeRepository::ensure_active(pool.get_ref(), type_id).await?;
    }

    let custom_fields =
        DynamicFieldService::validate_for(pool.get_ref(), EntityType::User, req.custom_fields.as_ref())
            .await?;
    let password_hash = AuthService::hash_password(&req.password)?;

    let user = UserRepository::create(
        pool.get_ref(),
        &NewUser {
            name: &req.name,
            email: &req.email,
            password_hash: &password_hash,
            phone: req.phone.as_deref(),
            role,
            user_type_id: req.user_type_id,
            custom_fields,
        },
    )
    .await?;

    let token = AuthService::issue_token(&config, user.id, user.role())?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(AuthResponse {
        token,
        user: user.to_response(),
    })))
}

/// POST /auth/login
pub async fn login(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    limiter: web::Data<AuthRateLimiter>,
    http_req: HttpRequest,
    body: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    limiter.check(&client_ip(&http_req))?;
    body.validate()?;

    let invalid = || AppError::Unauthorized("Invalid credentials".to_string());

    let user = UserRepository::find_by_email(pool.get_ref(), &body.email)
        .await?
        .ok_or_else(invalid)?;

    if !AuthService::verify_password(&body.password, &user.password_hash) {
        log::info!("Failed login for user {}", user.id);
        return Err(invalid());
    }

    if !user.is_active {
        return Err(AppError::Forbidden("Account is deactivated".to_string()));
    }

    UserRepository::touch_last_login(pool.get_ref(), user.id).await?;
    let user = UserRepository::get_by_id(pool.get_ref(), user.id).await?;
    let token = AuthService::issue_token(&config, user.id, user.role())?;

    log::info!("User {} logged in", user.id);
    Ok(HttpResponse::Ok().json(ApiResponse::ok(AuthResponse {
        token,
        user: user.to_response(),
    })))
}

/// GET /auth/me
pub async fn get_me(user: AuthUser) -> Result<impl Responder, AppError> {
    Ok(HttpResponse::Ok().json(ApiResponse::ok(user.to_response())))
}

/// PUT /auth/me
pub async fn update_me(
    pool: web::Data<PgPool>,
    user: AuthUser,
    body: web::Json<UpdateProfileRequest>,
) -> Result<impl Responder, AppError> {
    body.validate()?;

    let custom_fields = match body.custom_fields.as_ref() {
        Some(values) => Some(
            DynamicFieldService::validate_for(pool.get_ref(), EntityType::User, Some(values))
                .await?,
        ),
        None => None,
    };

    let updated =
        UserRepository::update_profile(pool.get_ref(), user.id, &body, custom_fields).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(updated.to_response())))
}

/// PUT /auth/password
/// Returns a fresh token so the client can replace the old one
pub async fn change_password(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    user: AuthUser,
    body: web::Json<ChangePasswordRequest>,
) -> Result<impl Responder, AppError> {
    body.validate()?;

    if !AuthService::verify_password(&body.current_password, &user.password_hash) {
        return Err(AppError::Unauthorized("Password is incorrect".to_string()));
    }

    let password_hash = AuthService::hash_password(&body.new_password)?;
    UserRepository::update_password(pool.get_ref(), user.id, &password_hash).await?;

    let token = AuthService::issue_token(&config, user.id, user.role())?;
    log::info!("User {} changed their password", user.id);

    Ok(HttpResponse::Ok().json(ApiResponse::ok(AuthResponse {
        token,
        user: user.to_response(),
    })))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/register", web::post().to(register))
            .route("/login", web::post().to(login))
            .route("/me", web::get().to(get_me))
            .route("/me", web::put().to(update_me))
            .route("/password", web::put().to(change_password)),
    );
}
