// src/services/property_service.rs
// DOCUMENTATION: Business logic for listings
// PURPOSE: Intermediary between handlers and repositories; geocoding,
// custom field validation and ownership checks live here

use crate::db::{LocationChange, MediaRepository, PropertyRepository};
use crate::errors::AppError;
use crate::models::{
    CreatePropertyRequest, EntityType, ListResponse, Page, Property, PropertyDetailResponse,
    PropertyResponse, Role, UpdatePropertyRequest, User,
};
use crate::services::access_policy::{ensure_owner_or_admin, require_role};
use crate::services::property_query::{project, PropertyQuery};
use crate::services::{DynamicFieldService, GeocodingClient};
use geojson::FeatureCollection;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

pub struct PropertyService;

impl PropertyService {
    /// Search listings, applying `select` projection when requested
    pub async fn search(
        pool: &PgPool,
        query: &PropertyQuery,
    ) -> Result<ListResponse<Value>, AppError> {
        let (properties, total) = PropertyRepository::search(pool, query).await?;

        let data = properties
            .iter()
            .map(|p| shape(p, query.select.as_deref()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ListResponse::new(data, total, query.page))
    }

    /// Same filters as search, as a GeoJSON FeatureCollection
    pub async fn geojson(pool: &PgPool, query: &PropertyQuery) -> Result<FeatureCollection, AppError> {
        let properties = PropertyRepository::search_geocoded(pool, query).await?;
        let features: Vec<_> = properties.iter().filter_map(Property::to_feature).collect();

        log::debug!("Map feed with {} features", features.len());
        Ok(FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        })
    }

    /// Detail view; counts the visit
    pub async fn get_detail(pool: &PgPool, id: Uuid) -> Result<PropertyDetailResponse, AppError> {
        let property = PropertyRepository::get_active(pool, id).await?;
        PropertyRepository::increment_views(pool, id).await?;
        let media = MediaRepository::list_for_property(pool, id).await?;

        let mut response = property.to_response();
        response.views += 1;

        Ok(PropertyDetailResponse {
            property: response,
            media: media.iter().map(|m| m.to_response()).collect(),
        })
    }

    pub async fn list_mine(
        pool: &PgPool,
        user: &User,
        page: Page,
    ) -> Result<ListResponse<PropertyResponse>, AppError> {
        require_role(user, &[Role::Agent, Role::Admin])?;
        let (properties, total) = PropertyRepository::list_by_agent(pool, user.id, page).await?;
        Ok(ListResponse::new(
            properties.iter().map(|p| p.to_response()).collect(),
            total,
            page,
        ))
    }

    /// Create a listing owned by `user`
    pub async fn create(
        pool: &PgPool,
        geocoder: &GeocodingClient,
        user: &User,
        req: CreatePropertyRequest,
    ) -> Result<PropertyResponse, AppError> {
        require_role(user, &[Role::Agent, Role::Admin])?;

        let custom_fields =
            DynamicFieldService::validate_for(pool, EntityType::Property, req.custom_fields.as_ref())
                .await?;
        let location = geocoder.geocode(&req.address_parts()).await?;

        let property =
            PropertyRepository::create(pool, &req, user.id, location.as_ref(), &custom_fields)
                .await?;
        Ok(property.to_response())
    }

    /// Partial update by the owner or an admin
    /// DOCUMENTATION: Re-geocodes only when an address component changed
    pub async fn update(
        pool: &PgPool,
        geocoder: &GeocodingClient,
        user: &User,
        id: Uuid,
        req: UpdatePropertyRequest,
    ) -> Result<PropertyResponse, AppError> {
        let current = PropertyRepository::get_active(pool, id).await?;
        ensure_owner_or_admin(user, current.agent_id)?;

        let custom_fields = match req.custom_fields.as_ref() {
            Some(values) => Some(
                DynamicFieldService::validate_for(pool, EntityType::Property, Some(values)).await?,
            ),
            None => None,
        };

        let location = if req.changes_address(&current) {
            match geocoder.geocode(&req.merged_address(&current)).await? {
                Some(found) => LocationChange::Set(found),
                None => LocationChange::Clear,
            }
        } else {
            LocationChange::Keep
        };

        let property =
            PropertyRepository::update(pool, id, &req, &location, custom_fields.as_ref()).await?;
        Ok(property.to_response())
    }

    pub async fn delete(pool: &PgPool, user: &User, id: Uuid) -> Result<(), AppError> {
        let current = PropertyRepository::get_active(pool, id).await?;
        ensure_owner_or_admin(user, current.agent_id)?;
        PropertyRepository::soft_delete(pool, id).await
    }
}

/// Serialize a listing, keeping only `select` fields when given
fn shape(property: &Property, select: Option<&[String]>) -> Result<Value, AppError> {
    let value = serde_json::to_value(property.to_response()).map_err(|e| {
        log::error!("Failed to serialize property {}: {}", property.id, e);
        AppError::InternalError
    })?;

    Ok(match select {
        Some(fields) => project(value, fields),
        None => value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::property::tests::sample_property;

    #[test]
    fn test_shape_without_select_keeps_everything() {
        let property = sample_property();
        let value = shape(&property, None).unwrap();
        assert_eq!(value["title"], "Sunny family house");
        assert_eq!(value["agent"]["name"], "Dana Agent");
    }

    #[test]
    fn test_shape_with_select() {
        let property = sample_property();
        let select = vec!["price".to_string(), "city".to_string()];
        let value = shape(&property, Some(&select)).unwrap();

        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 3);
        assert_eq!(value["id"], property.id.to_string());
        assert_eq!(value["price"], 350000.0);
        assert_eq!(value["city"], "Springfield");
    }
}
