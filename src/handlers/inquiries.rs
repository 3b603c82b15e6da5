// src/handlers/inquiries.rs
// DOCUMENTATION: HTTP handlers for inquiries
// PURPOSE: Logged-in users ask, listing agents answer

use crate::db::{InquiryRepository, PropertyRepository};
use crate::errors::AppError;
use crate::middleware::AuthUser;
use crate::models::{
    ApiResponse, CreateInquiryRequest, EntityType, InquiryListQuery, ListResponse, Page,
    RespondInquiryRequest, UpdateInquiryStatusRequest,
};
use crate::services::{
    ensure_can_set_inquiry_status, ensure_can_view_request, ensure_inquiry_open,
    ensure_listing_agent_or_admin, ensure_not_own_listing, DynamicFieldService, ListScope,
};
use actix_web::{web, HttpResponse, Responder};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

/// POST /inquiries
pub async fn create_inquiry(
    pool: web::Data<PgPool>,
    user: AuthUser,
    body: web::Json<CreateInquiryRequest>,
) -> Result<impl Responder, AppError> {
    body.validate()?;

    let property = PropertyRepository::get_active(pool.get_ref(), body.property_id).await?;
    ensure_not_own_listing(&user, property.agent_id)?;

    let custom_fields = DynamicFieldService::validate_for(
        pool.get_ref(),
        EntityType::Inquiry,
        body.custom_fields.as_ref(),
    )
    .await?;

    let inquiry = InquiryRepository::create(
        pool.get_ref(),
        &body,
        property.agent_id,
        user.id,
        &custom_fields,
    )
    .await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(inquiry.to_response())))
}

/// GET /inquiries
pub async fn list_inquiries(
    pool: web::Data<PgPool>,
    user: AuthUser,
    query: web::Query<InquiryListQuery>,
) -> Result<impl Responder, AppError> {
    let page = Page::new(query.page, query.limit);
    let scope = ListScope::for_user(&user);

    let (inquiries, total) = InquiryRepository::list(pool.get_ref(), scope, &query, page).await?;
    Ok(HttpResponse::Ok().json(ListResponse::new(
        inquiries.iter().map(|i| i.to_response()).collect(),
        total,
        page,
    )))
}

/// GET /inquiries/{id}
pub async fn get_inquiry(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let inquiry = InquiryRepository::get_by_id(pool.get_ref(), path.into_inner()).await?;
    ensure_can_view_request(&user, inquiry.agent_id, Some(inquiry.user_id))?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(inquiry.to_response())))
}

/// POST /inquiries/{id}/respond
pub async fn respond_inquiry(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<RespondInquiryRequest>,
) -> Result<impl Responder, AppError> {
    body.validate()?;

    let inquiry = InquiryRepository::get_by_id(pool.get_ref(), path.into_inner()).await?;
    ensure_listing_agent_or_admin(&user, inquiry.agent_id)?;
    ensure_inquiry_open(inquiry.status())?;

    let updated = InquiryRepository::respond(pool.get_ref(), inquiry.id, &body.response).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(updated.to_response())))
}

/// PUT /inquiries/{id}/status
pub async fn update_inquiry_status(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<UpdateInquiryStatusRequest>,
) -> Result<impl Responder, AppError> {
    let inquiry = InquiryRepository::get_by_id(pool.get_ref(), path.into_inner()).await?;
    ensure_can_set_inquiry_status(&user, inquiry.agent_id, inquiry.user_id, body.status)?;

    let updated =
        InquiryRepository::update_status(pool.get_ref(), inquiry.id, body.status).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(updated.to_response())))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/inquiries")
            .route("", web::post().to(create_inquiry))
            .route("", web::get().to(list_inquiries))
            .route("/{id}", web::get().to(get_inquiry))
            .route("/{id}/respond", web::post().to(respond_inquiry))
            .route("/{id}/status", web::put().to(update_inquiry_status)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use actix_web::{http::StatusCode, test, App};
    use serde_json::json;

    fn lazy_pool() -> PgPool {
        sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgresql://localhost/realty_test")
            .unwrap()
    }

    #[actix_rt::test]
    async fn test_create_inquiry_requires_login() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(lazy_pool()))
                .app_data(web::Data::new(Config::for_tests()))
                .configure(config),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/inquiries")
            .set_json(json!({
                "property_id": uuid::Uuid::new_v4(),
                "subject": "Viewing",
                "message": "Is the house still available?"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
    }

    #[actix_rt::test]
    async fn test_respond_rejects_malformed_token() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(lazy_pool()))
                .app_data(web::Data::new(Config::for_tests()))
                .configure(config),
        )
        .await;

        let req = test::TestRequest::post()
            .uri(&format!("/inquiries/{}/respond", uuid::Uuid::new_v4()))
            .insert_header(("Authorization", "Bearer not-a-jwt"))
            .set_json(json!({ "response": "Yes, come by on Saturday" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
