// src/models/property.rs
// DOCUMENTATION: Core data structures for property listings
// PURPOSE: Defines all serialization/deserialization models for API and database

use chrono::{DateTime, Utc};
use geo_types::Point;
use geojson::{feature::Id, Feature, Geometry, JsonObject};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::{AgentSummary, MediaResponse};

string_enum! {
    /// Kind of real estate being listed
    PropertyType {
        House => "house",
        Apartment => "apartment",
        Condo => "condo",
        Townhouse => "townhouse",
        Land => "land",
        Commercial => "commercial",
    }
}

string_enum! {
    /// Market status of a listing
    ListingStatus {
        ForSale => "for_sale",
        ForRent => "for_rent",
        Pending => "pending",
        Sold => "sold",
        Rented => "rented",
    }
}

/// Represents a complete property record from the database
/// DOCUMENTATION: Maps the properties table plus the populated agent and
/// primary image columns produced by the repository joins
#[derive(Debug, Clone, FromRow)]
pub struct Property {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub property_type: String,
    pub listing_status: String,
    pub price: f64,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub area_sqft: Option<f64>,
    pub year_built: Option<i32>,
    pub address: String,
    pub city: String,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: String,

    /// Address as normalised by the geocoder
    pub formatted_address: Option<String>,

    /// Set by geocoding, absent when the geocoder is not configured
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    pub amenities: Vec<String>,
    pub custom_fields: Value,
    pub agent_id: Uuid,
    pub is_featured: bool,

    /// Soft delete flag (true = active, false = deleted)
    pub is_active: bool,

    pub views: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[sqlx(default)]
    pub agent_name: Option<String>,
    #[sqlx(default)]
    pub agent_email: Option<String>,
    #[sqlx(default)]
    pub agent_phone: Option<String>,
    #[sqlx(default)]
    pub primary_image_url: Option<String>,
    #[sqlx(default)]
    pub primary_thumbnail_url: Option<String>,
}

/// Address pieces fed to the geocoder
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyAddress {
    pub address: String,
    pub city: String,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: String,
}

impl PropertyAddress {
    /// Single-line query string, skipping blank parts
    pub fn to_query(&self) -> String {
        [
            Some(self.address.as_str()),
            Some(self.city.as_str()),
            self.state.as_deref(),
            self.zip_code.as_deref(),
            Some(self.country.as_str()),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
    }
}

/// Coordinates resolved for an address
#[derive(Debug, Clone, PartialEq)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub formatted_address: Option<String>,
}

/// Floor area must be strictly positive; fractions are fine
pub fn validate_positive_area(area: f64) -> Result<(), ValidationError> {
    if area > 0.0 && area.is_finite() {
        Ok(())
    } else {
        Err(ValidationError::new("area_sqft_not_positive"))
    }
}

/// Request DTO for creating a new property
/// DOCUMENTATION: Data transfer object for POST /properties
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePropertyRequest {
    #[serde(deserialize_with = "crate::models::trim::trimmed")]
    #[validate(length(min = 5, max = 200))]
    pub title: String,

    #[serde(default, deserialize_with = "crate::models::trim::trimmed_opt")]
    #[validate(length(max = 5000))]
    pub description: Option<String>,

    pub property_type: PropertyType,

    /// Defaults to for_sale
    pub listing_status: Option<ListingStatus>,

    #[validate(range(min = 0.0))]
    pub price: f64,

    #[validate(range(min = 0, max = 100))]
    pub bedrooms: Option<i32>,

    #[validate(range(min = 0, max = 100))]
    pub bathrooms: Option<i32>,

    #[validate(custom = "validate_positive_area")]
    pub area_sqft: Option<f64>,

    #[validate(range(min = 1800, max = 2100))]
    pub year_built: Option<i32>,

    #[serde(deserialize_with = "crate::models::trim::trimmed")]
    #[validate(length(min = 1, max = 300))]
    pub address: String,

    #[serde(deserialize_with = "crate::models::trim::trimmed")]
    #[validate(length(min = 1, max = 100))]
    pub city: String,

    #[serde(default, deserialize_with = "crate::models::trim::trimmed_opt")]
    #[validate(length(max = 100))]
    pub state: Option<String>,

    #[serde(default, deserialize_with = "crate::models::trim::trimmed_opt")]
    #[validate(length(max = 20))]
    pub zip_code: Option<String>,

    /// Defaults to "US"
    #[serde(default, deserialize_with = "crate::models::trim::trimmed_opt")]
    #[validate(length(min = 1, max = 100))]
    pub country: Option<String>,

    #[validate(length(max = 50))]
    pub amenities: Option<Vec<String>>,

    pub custom_fields: Option<Value>,
}

impl CreatePropertyRequest {
    pub fn address_parts(&self) -> PropertyAddress {
        PropertyAddress {
            address: self.address.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            zip_code: self.zip_code.clone(),
            country: self.country.clone().unwrap_or_else(|| "US".to_string()),
        }
    }
}

/// Request DTO for updating an existing property
/// DOCUMENTATION: All fields are optional - only provided fields are updated
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdatePropertyRequest {
    #[serde(default, deserialize_with = "crate::models::trim::trimmed_opt")]
    #[validate(length(min = 5, max = 200))]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "crate::models::trim::trimmed_opt")]
    #[validate(length(max = 5000))]
    pub description: Option<String>,

    pub property_type: Option<PropertyType>,

    pub listing_status: Option<ListingStatus>,

    #[validate(range(min = 0.0))]
    pub price: Option<f64>,

    #[validate(range(min = 0, max = 100))]
    pub bedrooms: Option<i32>,

    #[validate(range(min = 0, max = 100))]
    pub bathrooms: Option<i32>,

    #[validate(custom = "validate_positive_area")]
    pub area_sqft: Option<f64>,

    #[validate(range(min = 1800, max = 2100))]
    pub year_built: Option<i32>,

    #[serde(default, deserialize_with = "crate::models::trim::trimmed_opt")]
    #[validate(length(min = 1, max = 300))]
    pub address: Option<String>,

    #[serde(default, deserialize_with = "crate::models::trim::trimmed_opt")]
    #[validate(length(min = 1, max = 100))]
    pub city: Option<String>,

    #[serde(default, deserialize_with = "crate::models::trim::trimmed_opt")]
    #[validate(length(max = 100))]
    pub state: Option<String>,

    #[serde(default, deserialize_with = "crate::models::trim::trimmed_opt")]
    #[validate(length(max = 20))]
    pub zip_code: Option<String>,

    #[serde(default, deserialize_with = "crate::models::trim::trimmed_opt")]
    #[validate(length(min = 1, max = 100))]
    pub country: Option<String>,

    #[validate(length(max = 50))]
    pub amenities: Option<Vec<String>>,

    pub custom_fields: Option<Value>,
}

impl UpdatePropertyRequest {
    /// Whether any address component differs from the stored one
    pub fn changes_address(&self, current: &Property) -> bool {
        fn differs(new: &Option<String>, old: &str) -> bool {
            new.as_deref().map(|v| v.trim() != old.trim()).unwrap_or(false)
        }

        differs(&self.address, &current.address)
            || differs(&self.city, &current.city)
            || differs(&self.state, current.state.as_deref().unwrap_or(""))
            || differs(&self.zip_code, current.zip_code.as_deref().unwrap_or(""))
            || differs(&self.country, &current.country)
    }

    /// Address after applying this update on top of `current`
    pub fn merged_address(&self, current: &Property) -> PropertyAddress {
        PropertyAddress {
            address: self.address.clone().unwrap_or_else(|| current.address.clone()),
            city: self.city.clone().unwrap_or_else(|| current.city.clone()),
            state: self.state.clone().or_else(|| current.state.clone()),
            zip_code: self.zip_code.clone().or_else(|| current.zip_code.clone()),
            country: self.country.clone().unwrap_or_else(|| current.country.clone()),
        }
    }
}

/// PUT /admin/properties/{id}
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModeratePropertyRequest {
    pub is_featured: Option<bool>,
    pub is_active: Option<bool>,
}

/// GET /admin/properties filters
#[derive(Debug, Default, Deserialize)]
pub struct AdminPropertyQuery {
    pub is_active: Option<bool>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Response DTO for API responses
#[derive(Debug, Clone, Serialize)]
pub struct PropertyResponse {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub property_type: String,
    pub listing_status: String,
    pub price: f64,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub area_sqft: Option<f64>,
    pub year_built: Option<i32>,
    pub address: String,
    pub city: String,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: String,
    pub formatted_address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub amenities: Vec<String>,
    pub custom_fields: Value,
    pub agent: Option<AgentSummary>,
    pub is_featured: bool,
    pub is_active: bool,
    pub views: i64,
    pub primary_image_url: Option<String>,
    pub primary_thumbnail_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Detailed response DTO for GET /properties/{id}
#[derive(Debug, Serialize)]
pub struct PropertyDetailResponse {
    #[serde(flatten)]
    pub property: PropertyResponse,
    pub media: Vec<MediaResponse>,
}

impl Property {
    pub fn location(&self) -> Option<Point<f64>> {
        match (self.longitude, self.latitude) {
            (Some(lng), Some(lat)) => Some(Point::new(lng, lat)),
            _ => None,
        }
    }

    pub fn agent_summary(&self) -> Option<AgentSummary> {
        match (&self.agent_name, &self.agent_email) {
            (Some(name), Some(email)) => Some(AgentSummary {
                id: self.agent_id,
                name: name.clone(),
                email: email.clone(),
                phone: self.agent_phone.clone(),
            }),
            _ => None,
        }
    }

    /// Convert Property to PropertyResponse for API
    pub fn to_response(&self) -> PropertyResponse {
        PropertyResponse {
            id: self.id,
            title: self.title.clone(),
            description: self.description.clone(),
            property_type: self.property_type.clone(),
            listing_status: self.listing_status.clone(),
            price: self.price,
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            area_sqft: self.area_sqft,
            year_built: self.year_built,
            address: self.address.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            zip_code: self.zip_code.clone(),
            country: self.country.clone(),
            formatted_address: self.formatted_address.clone(),
            latitude: self.latitude,
            longitude: self.longitude,
            amenities: self.amenities.clone(),
            custom_fields: self.custom_fields.clone(),
            agent: self.agent_summary(),
            is_featured: self.is_featured,
            is_active: self.is_active,
            views: self.views,
            primary_image_url: self.primary_image_url.clone(),
            primary_thumbnail_url: self.primary_thumbnail_url.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// GeoJSON point feature for the map view, None when not geocoded
    pub fn to_feature(&self) -> Option<Feature> {
        let point = self.location()?;

        let mut properties = JsonObject::new();
        properties.insert("title".to_string(), Value::from(self.title.clone()));
        properties.insert("price".to_string(), Value::from(self.price));
        properties.insert(
            "property_type".to_string(),
            Value::from(self.property_type.clone()),
        );
        properties.insert(
            "listing_status".to_string(),
            Value::from(self.listing_status.clone()),
        );
        properties.insert("bedrooms".to_string(), Value::from(self.bedrooms));
        properties.insert("bathrooms".to_string(), Value::from(self.bathrooms));
        properties.insert("city".to_string(), Value::from(self.city.clone()));
        properties.insert(
            "thumbnail_url".to_string(),
            self.primary_thumbnail_url
                .clone()
                .map(Value::from)
                .unwrap_or(Value::Null),
        );

        Some(Feature {
            bbox: None,
            geometry: Some(Geometry::new(geojson::Value::from(&point))),
            id: Some(Id::String(self.id.to_string())),
            properties: Some(properties),
            foreign_members: None,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn sample_property() -> Property {
        Property {
            id: Uuid::new_v4(),
            title: "Sunny family house".to_string(),
            description: Some("Three bedrooms near the park".to_string()),
            property_type: "house".to_string(),
            listing_status: "for_sale".to_string(),
            price: 350_000.0,
            bedrooms: 3,
            bathrooms: 2,
            area_sqft: Some(1800.0),
            year_built: Some(1998),
            address: "12 Oak Street".to_string(),
            city: "Springfield".to_string(),
            state: Some("IL".to_string()),
            zip_code: Some("62701".to_string()),
            country: "US".to_string(),
            formatted_address: None,
            latitude: Some(39.7817),
            longitude: Some(-89.6501),
            amenities: vec!["garage".to_string()],
            custom_fields: json!({}),
            agent_id: Uuid::new_v4(),
            is_featured: false,
            is_active: true,
            views: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            agent_name: Some("Dana Agent".to_string()),
            agent_email: Some("dana@example.com".to_string()),
            agent_phone: None,
            primary_image_url: None,
            primary_thumbnail_url: None,
        }
    }

    #[test]
    fn test_address_query_skips_blank_parts() {
        let address = PropertyAddress {
            address: "12 Oak Street".to_string(),
            city: "Springfield".to_string(),
            state: Some("  ".to_string()),
            zip_code: None,
            country: "US".to_string(),
        };
        assert_eq!(address.to_query(), "12 Oak Street, Springfield, US");
    }

    #[test]
    fn test_changes_address() {
        let property = sample_property();

        let price_only = UpdatePropertyRequest {
            price: Some(1.0),
            ..Default::default()
        };
        assert!(!price_only.changes_address(&property));

        let same_city = UpdatePropertyRequest {
            city: Some("Springfield ".to_string()),
            ..Default::default()
        };
        assert!(!same_city.changes_address(&property));

        let moved = UpdatePropertyRequest {
            zip_code: Some("62702".to_string()),
            ..Default::default()
        };
        assert!(moved.changes_address(&property));
        assert_eq!(moved.merged_address(&property).zip_code.as_deref(), Some("62702"));
        assert_eq!(moved.merged_address(&property).city, "Springfield");
    }

    #[test]
    fn test_create_request_validation() {
        let req: CreatePropertyRequest = serde_json::from_value(json!({
            "title": "Tiny",
            "property_type": "house",
            "price": -5.0,
            "address": "1 Main St",
            "city": "Springfield",
            "year_built": 1700
        }))
        .unwrap();

        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("title"));
        assert!(fields.contains_key("price"));
        assert!(fields.contains_key("year_built"));
        assert!(!fields.contains_key("city"));
    }

    #[test]
    fn test_area_must_be_positive() {
        let with_area = |area: f64| -> CreatePropertyRequest {
            serde_json::from_value(json!({
                "title": "Garden shed",
                "property_type": "land",
                "price": 1000.0,
                "address": "1 Main St",
                "city": "Springfield",
                "area_sqft": area
            }))
            .unwrap()
        };

        assert!(with_area(0.5).validate().is_ok());
        assert!(with_area(1200.0).validate().is_ok());
        assert!(with_area(0.0).validate().is_err());
        assert!(with_area(-3.0).validate().is_err());

        let update = UpdatePropertyRequest {
            area_sqft: Some(0.25),
            ..Default::default()
        };
        assert!(update.validate().is_ok());
    }

    #[test]
    fn test_text_is_trimmed_before_length_checks() {
        let req: CreatePropertyRequest = serde_json::from_value(json!({
            "title": "   ab   ",
            "property_type": "house",
            "price": 1.0,
            "address": "  1 Main St ",
            "city": " Springfield ",
            "state": "  "
        }))
        .unwrap();

        assert_eq!(req.title, "ab");
        assert_eq!(req.city, "Springfield");
        assert_eq!(req.state.as_deref(), Some(""));
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("title"));

        let update: UpdatePropertyRequest =
            serde_json::from_value(json!({ "title": "   ab   " })).unwrap();
        assert!(update.validate().is_err());
        assert!(update.city.is_none());
    }

    #[test]
    fn test_unknown_property_type_is_rejected() {
        let parsed: Result<CreatePropertyRequest, _> = serde_json::from_value(json!({
            "title": "Castle on the hill",
            "property_type": "castle",
            "price": 1.0,
            "address": "1 Hill Rd",
            "city": "Springfield"
        }));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_response_populates_agent() {
        let property = sample_property();
        let resp = property.to_response();
        let agent = resp.agent.unwrap();
        assert_eq!(agent.id, property.agent_id);
        assert_eq!(agent.name, "Dana Agent");
    }

    #[test]
    fn test_feature_uses_lng_lat_order() {
        let property = sample_property();
        let feature = property.to_feature().unwrap();
        let value = serde_json::to_value(&feature).unwrap();
        assert_eq!(value["geometry"]["type"], "Point");
        assert_eq!(value["geometry"]["coordinates"][0], -89.6501);
        assert_eq!(value["geometry"]["coordinates"][1], 39.7817);
        assert_eq!(value["properties"]["city"], "Springfield");
    }

    #[test]
    fn test_feature_requires_coordinates() {
        let mut property = sample_property();
        property.latitude = None;
        assert!(property.to_feature().is_none());
    }
}
