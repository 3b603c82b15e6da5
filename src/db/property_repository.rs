// src/db/property_repository.rs
// DOCUMENTATION: Database access layer for listings
// PURPOSE: All SQL touching the properties table

use crate::errors::AppError;
use crate::models::*;
use crate::services::PropertyQuery;
use serde_json::Value;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

/// Listing columns plus the populated agent and primary image
/// DOCUMENTATION: The LATERAL join picks the primary image, falling back to
/// the first one by display order
const SELECT_PROPERTY: &str = r#"
    SELECT
        p.*,
        u.name AS agent_name,
        u.email AS agent_email,
        u.phone AS agent_phone,
        img.url AS primary_image_url,
        img.thumbnail_url AS primary_thumbnail_url
    FROM properties p
    JOIN users u ON u.id = p.agent_id
    LEFT JOIN LATERAL (
        SELECT url, thumbnail_url
        FROM media
        WHERE property_id = p.id
        ORDER BY is_primary DESC, display_order ASC, created_at ASC
        LIMIT 1
    ) img ON true
"#;

/// Upper bound on features returned by the map feed
pub const MAP_FEATURE_LIMIT: i64 = 500;

/// What an update does to the stored coordinates
#[derive(Debug, Clone, PartialEq)]
pub enum LocationChange {
    Keep,
    Set(GeoLocation),
    /// Address changed but could not be geocoded
    Clear,
}

pub struct PropertyRepository;

impl PropertyRepository {
    /// Create new property
    /// Used by POST /properties
    pub async fn create(
        pool: &PgPool,
        req: &CreatePropertyRequest,
        agent_id: Uuid,
        location: Option<&GeoLocation>,
        custom_fields: &Value,
    ) -> Result<Property, AppError> {
        let id = Uuid::new_v4();
        let address = req.address_parts();

        sqlx::query(
            r#"
            INSERT INTO properties (
                id, title, description, property_type, listing_status,
                price, bedrooms, bathrooms, area_sqft, year_built,
                address, city, state, zip_code, country,
                formatted_address, latitude, longitude,
                amenities, custom_fields, agent_id
            )
            VALUES (
                $1, $2, $3, $4, $5,
                $6, $7, $8, $9, $10,
                $11, $12, $13, $14, $15,
                $16, $17, $18,
                $19, $20, $21
            )
            "#,
        )
        .bind(id) // $1
        .bind(req.title.trim()) // $2
        .bind(&req.description) // $3
        .bind(req.property_type.as_str()) // $4
        .bind(req.listing_status.unwrap_or(ListingStatus::ForSale).as_str()) // $5
        .bind(req.price) // $6
        .bind(req.bedrooms.unwrap_or(0)) // $7
        .bind(req.bathrooms.unwrap_or(0)) // $8
        .bind(req.area_sqft) // $9
        .bind(req.year_built) // $10
        .bind(address.address.trim()) // $11
        .bind(address.city.trim()) // $12
        .bind(&address.state) // $13
        .bind(&address.zip_code) // $14
        .bind(address.country.trim()) // $15
        .bind(location.and_then(|l| l.formatted_address.clone())) // $16
        .bind(location.map(|l| l.latitude)) // $17
        .bind(location.map(|l| l.longitude)) // $18
        .bind(req.amenities.clone().unwrap_or_default()) // $19
        .bind(custom_fields) // $20
        .bind(agent_id) // $21
        .execute(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to create property: {}", e);
            AppError::from(e)
        })?;

        log::info!("Created property {} for agent {}", id, agent_id);
        Self::get_by_id(pool, id).await
    }

    /// Active listing by id
    pub async fn get_active(pool: &PgPool, id: Uuid) -> Result<Property, AppError> {
        let sql = format!("{} WHERE p.id = $1 AND p.is_active = true", SELECT_PROPERTY);
        sqlx::query_as::<_, Property>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Property not found with id of {}", id)))
    }

    /// Listing by id regardless of the soft delete flag
    pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<Property, AppError> {
        let sql = format!("{} WHERE p.id = $1", SELECT_PROPERTY);
        sqlx::query_as::<_, Property>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Property not found with id of {}", id)))
    }

    /// Public search
    /// DOCUMENTATION: Filters, sort and paging come from the parsed query string
    pub async fn search(
        pool: &PgPool,
        query: &PropertyQuery,
    ) -> Result<(Vec<Property>, i64), AppError> {
        let mut count_qb = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM properties p WHERE p.is_active = true",
        );
        query.push_conditions(&mut count_qb);
        let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await.map_err(|e| {
            log::error!("Failed to count properties: {}", e);
            AppError::from(e)
        })?;

        let mut qb = QueryBuilder::<Postgres>::new(SELECT_PROPERTY);
        qb.push(" WHERE p.is_active = true");
        query.push_conditions(&mut qb);
        qb.push(query.order_by_clause());
        qb.push(" LIMIT ");
        qb.push_bind(query.page.limit);
        qb.push(" OFFSET ");
        qb.push_bind(query.page.offset());

        let properties = qb
            .build_query_as::<Property>()
            .fetch_all(pool)
            .await
            .map_err(|e| {
                log::error!("Failed to search properties: {}", e);
                AppError::from(e)
            })?;

        log::debug!("Property search returned {} of {}", properties.len(), total);
        Ok((properties, total))
    }

    /// Geocoded listings for the map view, ignoring paging
    pub async fn search_geocoded(
        pool: &PgPool,
        query: &PropertyQuery,
    ) -> Result<Vec<Property>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(SELECT_PROPERTY);
        qb.push(" WHERE p.is_active = true AND p.latitude IS NOT NULL AND p.longitude IS NOT NULL");
        query.push_conditions(&mut qb);
        qb.push(query.order_by_clause());
        qb.push(" LIMIT ");
        qb.push_bind(MAP_FEATURE_LIMIT);

        let properties = qb.build_query_as::<Property>().fetch_all(pool).await?;
        Ok(properties)
    }

    /// Listings owned by one agent, newest first
    pub async fn list_by_agent(
        pool: &PgPool,
        agent_id: Uuid,
        page: Page,
    ) -> Result<(Vec<Property>, i64), AppError> {
        let (total,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM properties WHERE agent_id = $1 AND is_active = true",
        )
        .bind(agent_id)
        .fetch_one(pool)
        .await?;

        let sql = format!(
            "{} WHERE p.agent_id = $1 AND p.is_active = true ORDER BY p.created_at DESC, p.id ASC LIMIT $2 OFFSET $3",
            SELECT_PROPERTY
        );
        let properties = sqlx::query_as::<_, Property>(&sql)
            .bind(agent_id)
            .bind(page.limit)
            .bind(page.offset())
            .fetch_all(pool)
            .await?;

        Ok((properties, total))
    }

    /// Admin listing, including soft-deleted rows
    pub async fn admin_list(
        pool: &PgPool,
        is_active: Option<bool>,
        page: Page,
    ) -> Result<(Vec<Property>, i64), AppError> {
        let (total,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM properties WHERE ($1::boolean IS NULL OR is_active = $1)",
        )
        .bind(is_active)
        .fetch_one(pool)
        .await?;

        let sql = format!(
            "{} WHERE ($1::boolean IS NULL OR p.is_active = $1) ORDER BY p.created_at DESC, p.id ASC LIMIT $2 OFFSET $3",
            SELECT_PROPERTY
        );
        let properties = sqlx::query_as::<_, Property>(&sql)
            .bind(is_active)
            .bind(page.limit)
            .bind(page.offset())
            .fetch_all(pool)
            .await?;

        Ok((properties, total))
    }

    /// Partial update
    /// DOCUMENTATION: Only provided fields are updated (COALESCE pattern)
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        req: &UpdatePropertyRequest,
        location: &LocationChange,
        custom_fields: Option<&Value>,
    ) -> Result<Property, AppError> {
        let (touch_location, lat, lng, formatted) = match location {
            LocationChange::Keep => (false, None, None, None),
            LocationChange::Set(l) => (
                true,
                Some(l.latitude),
                Some(l.longitude),
                l.formatted_address.clone(),
            ),
            LocationChange::Clear => (true, None, None, None),
        };

        let result = sqlx::query(
            r#"
            UPDATE properties SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                property_type = COALESCE($4, property_type),
                listing_status = COALESCE($5, listing_status),
                price = COALESCE($6, price),
                bedrooms = COALESCE($7, bedrooms),
                bathrooms = COALESCE($8, bathrooms),
                area_sqft = COALESCE($9, area_sqft),
                year_built = COALESCE($10, year_built),
                address = COALESCE($11, address),
                city = COALESCE($12, city),
                state = COALESCE($13, state),
                zip_code = COALESCE($14, zip_code),
                country = COALESCE($15, country),
                amenities = COALESCE($16, amenities),
                custom_fields = COALESCE($17, custom_fields),
                latitude = CASE WHEN $18 THEN $19 ELSE latitude END,
                longitude = CASE WHEN $18 THEN $20 ELSE longitude END,
                formatted_address = CASE WHEN $18 THEN $21 ELSE formatted_address END,
                updated_at = NOW()
            WHERE id = $1 AND is_active = true
            "#,
        )
        .bind(id)
        .bind(req.title.as_deref().map(str::trim))
        .bind(&req.description)
        .bind(req.property_type.map(|t| t.as_str()))
        .bind(req.listing_status.map(|s| s.as_str()))
        .bind(req.price)
        .bind(req.bedrooms)
        .bind(req.bathrooms)
        .bind(req.area_sqft)
        .bind(req.year_built)
        .bind(req.address.as_deref().map(str::trim))
        .bind(req.city.as_deref().map(str::trim))
        .bind(&req.state)
        .bind(&req.zip_code)
        .bind(req.country.as_deref().map(str::trim))
        .bind(&req.amenities)
        .bind(custom_fields)
        .bind(touch_location)
        .bind(lat)
        .bind(lng)
        .bind(formatted)
        .execute(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to update property {}: {}", id, e);
            AppError::from(e)
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Property not found with id of {}", id)));
        }

        log::info!("Updated property {}", id);
        Self::get_by_id(pool, id).await
    }

    /// Soft delete (sets is_active = false)
    pub async fn soft_delete(pool: &PgPool, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE properties SET is_active = false, updated_at = NOW() WHERE id = $1 AND is_active = true",
        )
        .bind(id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Property not found with id of {}", id)));
        }

        log::info!("Soft deleted property {}", id);
        Ok(())
    }

    /// Count a detail page view
    pub async fn increment_views(pool: &PgPool, id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE properties SET views = views + 1 WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn moderate(
        pool: &PgPool,
        id: Uuid,
        req: &ModeratePropertyRequest,
    ) -> Result<Property, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE properties SET
                is_featured = COALESCE($2, is_featured),
                is_active = COALESCE($3, is_active),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(req.is_featured)
        .bind(req.is_active)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Property not found with id of {}", id)));
        }

        log::info!(
            "Moderated property {} (featured: {:?}, active: {:?})",
            id,
            req.is_featured,
            req.is_active
        );
        Self::get_by_id(pool, id).await
    }

    pub async fn count_active_by_status(pool: &PgPool) -> Result<Vec<(String, i64)>, AppError> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            r#"
            SELECT listing_status, COUNT(*)
            FROM properties
            WHERE is_active = true
            GROUP BY listing_status
            ORDER BY listing_status
            "#,
        )
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }
}
