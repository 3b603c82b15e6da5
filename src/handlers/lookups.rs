// src/handlers/lookups.rs
// DOCUMENTATION: Public reference data for client forms
// PURPOSE: Active dynamic field definitions and user types

use crate::db::{DynamicFieldRepository, UserTypeRepository};
use crate::errors::AppError;
use crate::models::{ApiResponse, DynamicFieldQuery};
use actix_web::{web, HttpResponse, Responder};
use sqlx::PgPool;

/// GET /dynamic-fields?entity_type=property
pub async fn list_dynamic_fields(
    pool: web::Data<PgPool>,
    query: web::Query<DynamicFieldQuery>,
) -> Result<impl Responder, AppError> {
    let fields = DynamicFieldRepository::list(pool.get_ref(), query.entity_type, true).await?;
    let data: Vec<_> = fields.iter().map(|f| f.to_response()).collect();
    Ok(HttpResponse::Ok().json(ApiResponse::ok(data)))
}

/// GET /user-types
pub async fn list_user_types(pool: web::Data<PgPool>) -> Result<impl Responder, AppError> {
    let types = UserTypeRepository::list(pool.get_ref(), true).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(types)))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.route("/dynamic-fields", web::get().to(list_dynamic_fields))
        .route("/user-types", web::get().to(list_user_types));
}
