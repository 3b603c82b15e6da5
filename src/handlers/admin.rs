// src/handlers/admin.rs
// DOCUMENTATION: Admin console handlers
// PURPOSE: User management, listing moderation, form configuration and
// dashboard statistics. Every route requires the admin role.

use crate::db::{
    ContactRepository, DynamicFieldRepository, InquiryRepository, MediaRepository,
    PropertyRepository, UserRepository, UserTypeRepository,
};
use crate::errors::AppError;
use crate::middleware::AuthUser;
use crate::models::{
    AdminPropertyQuery, AdminStats, AdminUpdateUserRequest, ApiResponse, CreateDynamicFieldRequest,
    CreateUserTypeRequest, DynamicFieldQuery, FieldType, ListResponse, ModeratePropertyRequest,
    Page, Role, UpdateDynamicFieldRequest, UpdateUserTypeRequest, UserListQuery,
};
use crate::services::{ensure_admin_keeps_access, ensure_not_self, require_role};
use actix_web::{web, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

/// Reject callers without the admin role
fn verify_admin(user: &AuthUser) -> Result<(), AppError> {
    require_role(user, &[Role::Admin]).map_err(|e| {
        log::warn!("Non-admin user {} hit an admin route", user.id);
        e
    })
}

/// Select fields need at least one option to choose from
fn check_select_options(field_type: FieldType, options: &[String]) -> Result<(), AppError> {
    if field_type == FieldType::Select && options.iter().all(|o| o.trim().is_empty()) {
        return Err(AppError::ValidationError(
            "options: select fields need at least one option".to_string(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// GET /admin/users
pub async fn list_users(
    pool: web::Data<PgPool>,
    user: AuthUser,
    query: web::Query<UserListQuery>,
) -> Result<impl Responder, AppError> {
    verify_admin(&user)?;

    let page = Page::new(query.page, query.limit);
    let (users, total) = UserRepository::list(pool.get_ref(), &query, page).await?;
    Ok(HttpResponse::Ok().json(ListResponse::new(
        users.iter().map(|u| u.to_response()).collect(),
        total,
        page,
    )))
}

/// GET /admin/users/{id}
pub async fn get_user(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    verify_admin(&user)?;
    let found = UserRepository::get_by_id(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(found.to_response())))
}

/// PUT /admin/users/{id}
pub async fn update_user(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<AdminUpdateUserRequest>,
) -> Result<impl Responder, AppError> {
    verify_admin(&user)?;
    body.validate()?;

    let target_id = path.into_inner();
    ensure_admin_keeps_access(&user, target_id, &body)?;

    if let Some(type_id) = body.user_type_id {
        UserTypeRepository::get_by_id(pool.get_ref(), type_id)
            .await
            .map_err(|e| match e {
                AppError::NotFound(_) => {
                    AppError::InvalidInput(format!("Unknown user type {}", type_id))
                }
                other => other,
            })?;
    }

    let updated = UserRepository::admin_update(pool.get_ref(), target_id, &body).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(updated.to_response())))
}

/// DELETE /admin/users/{id}
pub async fn delete_user(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    verify_admin(&user)?;

    let target_id = path.into_inner();
    ensure_not_self(&user, target_id)?;

    UserRepository::delete(pool.get_ref(), target_id).await?;
    log::info!("Admin {} deleted user {}", user.id, target_id);
    Ok(HttpResponse::Ok().json(ApiResponse::ok(json!({}))))
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

/// GET /admin/properties
/// Includes soft-deleted listings unless `is_active` narrows it
pub async fn list_properties(
    pool: web::Data<PgPool>,
    user: AuthUser,
    query: web::Query<AdminPropertyQuery>,
) -> Result<impl Responder, AppError> {
    verify_admin(&user)?;

    let page = Page::new(query.page, query.limit);
    let (properties, total) =
        PropertyRepository::admin_list(pool.get_ref(), query.is_active, page).await?;
    Ok(HttpResponse::Ok().json(ListResponse::new(
        properties.iter().map(|p| p.to_response()).collect(),
        total,
        page,
    )))
}

/// PUT /admin/properties/{id}
pub async fn moderate_property(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<ModeratePropertyRequest>,
) -> Result<impl Responder, AppError> {
    verify_admin(&user)?;
    let property = PropertyRepository::moderate(pool.get_ref(), path.into_inner(), &body).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(property.to_response())))
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// GET /admin/stats
pub async fn stats(pool: web::Data<PgPool>, user: AuthUser) -> Result<impl Responder, AppError> {
    verify_admin(&user)?;
    let pool = pool.get_ref();

    let (users, properties, contacts, inquiries, media) = tokio::try_join!(
        UserRepository::count_by_role(pool),
        PropertyRepository::count_active_by_status(pool),
        ContactRepository::count_by_status(pool),
        InquiryRepository::count_by_status(pool),
        MediaRepository::count_all(pool),
    )?;

    let stats = AdminStats::from_counts(users, properties, contacts, inquiries, media);
    Ok(HttpResponse::Ok().json(ApiResponse::ok(stats)))
}

// ---------------------------------------------------------------------------
// Dynamic fields
// ---------------------------------------------------------------------------

/// GET /admin/dynamic-fields
pub async fn list_dynamic_fields(
    pool: web::Data<PgPool>,
    user: AuthUser,
    query: web::Query<DynamicFieldQuery>,
) -> Result<impl Responder, AppError> {
    verify_admin(&user)?;
    let fields = DynamicFieldRepository::list(pool.get_ref(), query.entity_type, false).await?;
    let data: Vec<_> = fields.iter().map(|f| f.to_response()).collect();
    Ok(HttpResponse::Ok().json(ApiResponse::ok(data)))
}

/// GET /admin/dynamic-fields/{id}
pub async fn get_dynamic_field(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    verify_admin(&user)?;
    let field = DynamicFieldRepository::get_by_id(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(field.to_response())))
}

/// POST /admin/dynamic-fields
pub async fn create_dynamic_field(
    pool: web::Data<PgPool>,
    user: AuthUser,
    body: web::Json<CreateDynamicFieldRequest>,
) -> Result<impl Responder, AppError> {
    verify_admin(&user)?;
    body.validate()?;
    check_select_options(body.field_type, &body.options)?;

    let field = DynamicFieldRepository::create(pool.get_ref(), &body).await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(field.to_response())))
}

/// PUT /admin/dynamic-fields/{id}
pub async fn update_dynamic_field(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<UpdateDynamicFieldRequest>,
) -> Result<impl Responder, AppError> {
    verify_admin(&user)?;
    body.validate()?;

    let id = path.into_inner();
    let current = DynamicFieldRepository::get_by_id(pool.get_ref(), id).await?;
    let field_type = body.field_type.unwrap_or_else(|| current.field_type());
    let options = body.options.as_ref().unwrap_or(&current.options);
    check_select_options(field_type, options)?;

    let field = DynamicFieldRepository::update(pool.get_ref(), id, &body).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(field.to_response())))
}

/// DELETE /admin/dynamic-fields/{id}
/// Stored values under the key are left in place
pub async fn delete_dynamic_field(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    verify_admin(&user)?;
    DynamicFieldRepository::delete(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(json!({}))))
}

// ---------------------------------------------------------------------------
// User types
// ---------------------------------------------------------------------------

/// GET /admin/user-types
pub async fn list_user_types(
    pool: web::Data<PgPool>,
    user: AuthUser,
) -> Result<impl Responder, AppError> {
    verify_admin(&user)?;
    let types = UserTypeRepository::list(pool.get_ref(), false).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(types)))
}

/// GET /admin/user-types/{id}
pub async fn get_user_type(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    verify_admin(&user)?;
    let user_type = UserTypeRepository::get_by_id(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(user_type)))
}

/// POST /admin/user-types
pub async fn create_user_type(
    pool: web::Data<PgPool>,
    user: AuthUser,
    body: web::Json<CreateUserTypeRequest>,
) -> Result<impl Responder, AppError> {
    verify_admin(&user)?;
    body.validate()?;
    let user_type = UserTypeRepository::create(pool.get_ref(), &body).await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(user_type)))
}

/// PUT /admin/user-types/{id}
pub async fn update_user_type(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<UpdateUserTypeRequest>,
) -> Result<impl Responder, AppError> {
    verify_admin(&user)?;
    body.validate()?;
    let user_type =
        UserTypeRepository::update(pool.get_ref(), path.into_inner(), &body).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(user_type)))
}

/// DELETE /admin/user-types/{id}
pub async fn delete_user_type(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    verify_admin(&user)?;
    UserTypeRepository::delete(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(json!({}))))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/users", web::get().to(list_users))
            .route("/users/{id}", web::get().to(get_user))
            .route("/users/{id}", web::put().to(update_user))
            .route("/users/{id}", web::delete().to(delete_user))
            .route("/properties", web::get().to(list_properties))
            .route("/properties/{id}", web::put().to(moderate_property))
            .route("/stats", web::get().to(stats))
            .route("/dynamic-fields", web::get().to(list_dynamic_fields))
            .route("/dynamic-fields", web::post().to(create_dynamic_field))
            .route("/dynamic-fields/{id}", web::get().to(get_dynamic_field))
            .route("/dynamic-fields/{id}", web::put().to(update_dynamic_field))
            .route("/dynamic-fields/{id}", web::delete().to(delete_dynamic_field))
            .route("/user-types", web::get().to(list_user_types))
            .route("/user-types", web::post().to(create_user_type))
            .route("/user-types/{id}", web::get().to(get_user_type))
            .route("/user-types/{id}", web::put().to(update_user_type))
            .route("/user-types/{id}", web::delete().to(delete_user_type)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::access_policy::tests::user_with_role;

    #[test]
    fn test_verify_admin() {
        assert!(verify_admin(&AuthUser(user_with_role(Role::Admin))).is_ok());
        assert!(matches!(
            verify_admin(&AuthUser(user_with_role(Role::Agent))),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_select_fields_need_options() {
        assert!(check_select_options(FieldType::Select, &[]).is_err());
        assert!(check_select_options(FieldType::Select, &[" ".to_string()]).is_err());
        assert!(check_select_options(FieldType::Select, &["gas".to_string()]).is_ok());
        assert!(check_select_options(FieldType::Text, &[]).is_ok());
    }
}
