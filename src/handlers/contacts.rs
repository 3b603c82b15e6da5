// src/handlers/contacts.rs
// DOCUMENTATION: HTTP handlers for contact requests
// PURPOSE: Public contact form plus the agent/admin follow-up views

use crate::db::{ContactRepository, PropertyRepository};
use crate::errors::AppError;
use crate::middleware::{AuthUser, OptionalAuthUser};
use crate::models::{
    ApiResponse, ContactListQuery, CreateContactRequest, EntityType, ListResponse, Page, Role,
    UpdateContactStatusRequest,
};
use crate::services::{
    ensure_can_view_request, ensure_listing_agent_or_admin, require_role, DynamicFieldService,
    ListScope,
};
use actix_web::{web, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

/// POST /contacts
/// Anyone may send one; a logged-in sender is linked to the request
pub async fn create_contact(
    pool: web::Data<PgPool>,
    sender: OptionalAuthUser,
    body: web::Json<CreateContactRequest>,
) -> Result<impl Responder, AppError> {
    body.validate()?;

    let property = PropertyRepository::get_active(pool.get_ref(), body.property_id).await?;
    let custom_fields = DynamicFieldService::validate_for(
        pool.get_ref(),
        EntityType::ContactRequest,
        body.custom_fields.as_ref(),
    )
    .await?;

    let user_id = sender.0.as_ref().map(|u| u.id);
    let contact = ContactRepository::create(
        pool.get_ref(),
        &body,
        property.agent_id,
        user_id,
        &custom_fields,
    )
    .await?;

    Ok(HttpResponse::Created().json(ApiResponse::ok(contact.to_response())))
}

/// GET /contacts
/// Admins see everything, agents their listings, users their own requests
pub async fn list_contacts(
    pool: web::Data<PgPool>,
    user: AuthUser,
    query: web::Query<ContactListQuery>,
) -> Result<impl Responder, AppError> {
    let page = Page::new(query.page, query.limit);
    let scope = ListScope::for_user(&user);

    let (contacts, total) = ContactRepository::list(pool.get_ref(), scope, &query, page).await?;
    Ok(HttpResponse::Ok().json(ListResponse::new(
        contacts.iter().map(|c| c.to_response()).collect(),
        total,
        page,
    )))
}

/// GET /contacts/{id}
pub async fn get_contact(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let contact = ContactRepository::get_by_id(pool.get_ref(), path.into_inner()).await?;
    ensure_can_view_request(&user, contact.agent_id, contact.user_id)?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(contact.to_response())))
}

/// PUT /contacts/{id}/status
pub async fn update_contact_status(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<UpdateContactStatusRequest>,
) -> Result<impl Responder, AppError> {
    let contact = ContactRepository::get_by_id(pool.get_ref(), path.into_inner()).await?;
    ensure_listing_agent_or_admin(&user, contact.agent_id)?;

    let updated = ContactRepository::update_status(pool.get_ref(), contact.id, body.status).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(updated.to_response())))
}

/// DELETE /contacts/{id}
pub async fn delete_contact(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    require_role(&user, &[Role::Admin])?;
    ContactRepository::delete(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(json!({}))))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/contacts")
            .route("", web::post().to(create_contact))
            .route("", web::get().to(list_contacts))
            .route("/{id}", web::get().to(get_contact))
            .route("/{id}", web::delete().to(delete_contact))
            .route("/{id}/status", web::put().to(update_contact_status)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use actix_web::{http::StatusCode, test, App};

    fn lazy_pool() -> PgPool {
        sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgresql://localhost/realty_test")
            .unwrap()
    }

    #[actix_rt::test]
    async fn test_listing_contacts_requires_login() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(lazy_pool()))
                .app_data(web::Data::new(Config::for_tests()))
                .configure(config),
        )
        .await;

        let req = test::TestRequest::get().uri("/contacts").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
    }

    #[actix_rt::test]
    async fn test_status_update_requires_login() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(lazy_pool()))
                .app_data(web::Data::new(Config::for_tests()))
                .configure(config),
        )
        .await;

        let req = test::TestRequest::put()
            .uri(&format!("/contacts/{}/status", uuid::Uuid::new_v4()))
            .set_json(json!({ "status": "contacted" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
