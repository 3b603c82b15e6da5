// src/handlers/properties.rs
// DOCUMENTATION: HTTP handlers for property listings
// PURPOSE: Parse requests, call services, return responses

use crate::errors::AppError;
use crate::middleware::AuthUser;
use crate::models::{ApiResponse, CreatePropertyRequest, PageQuery, UpdatePropertyRequest};
use crate::services::{GeocodingClient, PropertyQuery, PropertyService};
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

/// Raw `key=value` pairs in order, so `price[gte]` style keys survive
fn query_pairs(req: &HttpRequest) -> Result<PropertyQuery, AppError> {
    let pairs = web::Query::<Vec<(String, String)>>::from_query(req.query_string())
        .map_err(|e| AppError::InvalidInput(format!("Invalid query string: {}", e)))?;
    PropertyQuery::parse(&pairs)
}

/// GET /properties
/// Filtered, sorted, paginated search over active listings
pub async fn list_properties(
    pool: web::Data<PgPool>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let query = query_pairs(&req)?;
    let results = PropertyService::search(pool.get_ref(), &query).await?;
    Ok(HttpResponse::Ok().json(results))
}

/// GET /properties/geojson
/// Map feed with the same filters as the list
pub async fn properties_geojson(
    pool: web::Data<PgPool>,
    req: HttpRequest,
) -> Result<impl Responder, AppError> {
    let query = query_pairs(&req)?;
    let collection = PropertyService::geojson(pool.get_ref(), &query).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(collection)))
}

/// GET /properties/mine
pub async fn my_properties(
    pool: web::Data<PgPool>,
    user: AuthUser,
    query: web::Query<PageQuery>,
) -> Result<impl Responder, AppError> {
    let results = PropertyService::list_mine(pool.get_ref(), &user, query.resolve()).await?;
    Ok(HttpResponse::Ok().json(results))
}

/// GET /properties/{id}
pub async fn get_property(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let detail = PropertyService::get_detail(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(detail)))
}

/// POST /properties
pub async fn create_property(
    pool: web::Data<PgPool>,
    geocoder: web::Data<GeocodingClient>,
    user: AuthUser,
    body: web::Json<CreatePropertyRequest>,
) -> Result<impl Responder, AppError> {
    body.validate()?;

    let property =
        PropertyService::create(pool.get_ref(), &geocoder, &user, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(property)))
}

/// PUT /properties/{id}
pub async fn update_property(
    pool: web::Data<PgPool>,
    geocoder: web::Data<GeocodingClient>,
    user: AuthUser,
    path: web::Path<Uuid>,
    body: web::Json<UpdatePropertyRequest>,
) -> Result<impl Responder, AppError> {
    body.validate()?;

    let property = PropertyService::update(
        pool.get_ref(),
        &geocoder,
        &user,
        path.into_inner(),
        body.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(property)))
}

/// DELETE /properties/{id}
/// Soft delete; the row stays for contacts and inquiries
pub async fn delete_property(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    PropertyService::delete(pool.get_ref(), &user, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(json!({}))))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/properties")
            .route("", web::get().to(list_properties))
            .route("", web::post().to(create_property))
            .route("/geojson", web::get().to(properties_geojson))
            .route("/mine", web::get().to(my_properties))
            .route("/{id}", web::get().to(get_property))
            .route("/{id}", web::put().to(update_property))
            .route("/{id}", web::delete().to(delete_property)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_query_pairs_keep_bracket_keys() {
        let req = TestRequest::get()
            .uri("/properties?price%5Bgte%5D=100000&city=Springfield&sort=-price")
            .to_http_request();
        let query = query_pairs(&req).unwrap();
        assert_eq!(query.filters.len(), 2);
        assert!(query.sort[0].descending);
    }

    #[test]
    fn test_query_pairs_reject_unknown_field() {
        let req = TestRequest::get()
            .uri("/properties?password=x")
            .to_http_request();
        assert!(matches!(query_pairs(&req), Err(AppError::InvalidInput(_))));
    }
}
