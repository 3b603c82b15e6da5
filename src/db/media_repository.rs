// src/db/media_repository.rs
// DOCUMENTATION: Database operations for uploaded images
// PURPOSE: Media rows and the single-primary-image invariant per property

use crate::errors::AppError;
use crate::models::*;
use sqlx::PgPool;
use uuid::Uuid;

/// Partial unique index allowing one primary image per property
const ONE_PRIMARY_INDEX: &str = "idx_media_one_primary";

/// Primary when the property has no media yet
const FIRST_FOR_PROPERTY: &str =
    "$2 IS NOT NULL AND NOT EXISTS (SELECT 1 FROM media WHERE property_id = $2)";

fn insert_sql(is_primary: &str) -> String {
    format!(
        r#"
        INSERT INTO media (
            id, property_id, uploaded_by, url, thumbnail_url, delete_url,
            provider_id, file_name, mime_type, size_bytes, width, height,
            is_primary, display_order
        )
        VALUES (
            $1, $2, $3, $4, $5, $6,
            $7, $8, $9, $10, $11, $12,
            {},
            COALESCE((SELECT MAX(display_order) + 1 FROM media WHERE property_id = $2), 0)
        )
        RETURNING *
        "#,
        is_primary
    )
}

/// Another upload claimed the primary slot between our check and insert
fn lost_primary_race(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.code().as_deref() == Some("23505")
                && db_err.constraint() == Some(ONE_PRIMARY_INDEX)
        }
        _ => false,
    }
}

pub struct MediaRepository;

impl MediaRepository {
    /// Insert an uploaded image
    /// DOCUMENTATION: The first image attached to a property becomes primary;
    /// later ones are appended to the display order. Concurrent first uploads
    /// resolve to one primary, the rest are stored as secondary.
    pub async fn create(pool: &PgPool, media: &NewMedia) -> Result<Media, AppError> {
        let created = match Self::insert(pool, media, FIRST_FOR_PROPERTY).await {
            Err(e) if lost_primary_race(&e) => {
                log::warn!(
                    "Primary image for property {:?} already taken, storing {} as secondary",
                    media.property_id,
                    media.url
                );
                Self::insert(pool, media, "FALSE").await
            }
            other => other,
        }
        .map_err(|e| {
            log::error!("Failed to store media {}: {}", media.url, e);
            AppError::from(e)
        })?;

        log::info!(
            "Stored media {} (property: {:?}, primary: {})",
            created.id,
            created.property_id,
            created.is_primary
        );
        Ok(created)
    }

    async fn insert(pool: &PgPool, media: &NewMedia, is_primary: &str) -> Result<Media, sqlx::Error> {
        sqlx::query_as::<_, Media>(&insert_sql(is_primary))
            .bind(Uuid::new_v4())
            .bind(media.property_id)
            .bind(media.uploaded_by)
            .bind(&media.url)
            .bind(&media.thumbnail_url)
            .bind(&media.delete_url)
            .bind(&media.provider_id)
            .bind(&media.file_name)
            .bind(&media.mime_type)
            .bind(media.size_bytes)
            .bind(media.width)
            .bind(media.height)
            .fetch_one(pool)
            .await
    }

    pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<Media, AppError> {
        sqlx::query_as::<_, Media>("SELECT * FROM media WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Media not found with id of {}", id)))
    }

    /// Get media for a property, primary first
    pub async fn list_for_property(pool: &PgPool, property_id: Uuid) -> Result<Vec<Media>, AppError> {
        let media = sqlx::query_as::<_, Media>(
            r#"
            SELECT * FROM media
            WHERE property_id = $1
            ORDER BY is_primary DESC, display_order ASC, created_at ASC
            "#,
        )
        .bind(property_id)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to get media for property {}: {}", property_id, e);
            AppError::from(e)
        })?;
        Ok(media)
    }

    /// Mark one image as primary and unset the others
    pub async fn set_primary(pool: &PgPool, property_id: Uuid, media_id: Uuid) -> Result<Media, AppError> {
        let mut tx = pool.begin().await?;

        // Clear first so the partial unique index never sees two primaries
        sqlx::query(
            "UPDATE media SET is_primary = FALSE, updated_at = NOW() WHERE property_id = $1 AND is_primary",
        )
        .bind(property_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            log::error!("Failed to unset primary media: {}", e);
            AppError::from(e)
        })?;

        let updated = sqlx::query_as::<_, Media>(
            r#"
            UPDATE media
            SET is_primary = TRUE, updated_at = NOW()
            WHERE id = $1 AND property_id = $2
            RETURNING *
            "#,
        )
        .bind(media_id)
        .bind(property_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Media not found with id of {}", media_id)))?;

        tx.commit().await?;

        log::info!("Media {} is now primary for property {}", media_id, property_id);
        Ok(updated)
    }

    /// Delete a row; when it was the primary image the next one takes over
    pub async fn delete(pool: &PgPool, media: &Media) -> Result<(), AppError> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM media WHERE id = $1")
            .bind(media.id)
            .execute(&mut *tx)
            .await?;

        if let (true, Some(property_id)) = (media.is_primary, media.property_id) {
            sqlx::query(
                r#"
                UPDATE media SET is_primary = TRUE, updated_at = NOW()
                WHERE id = (
                    SELECT id FROM media
                    WHERE property_id = $1
                    ORDER BY display_order ASC, created_at ASC
                    LIMIT 1
                )
                "#,
            )
            .bind(property_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        log::info!("Deleted media {}", media.id);
        Ok(())
    }

    pub async fn count_all(pool: &PgPool) -> Result<i64, AppError> {
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM media")
            .fetch_one(pool)
            .await?;
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_media_for_property_is_primary() {
        let sql = insert_sql(FIRST_FOR_PROPERTY);
        assert!(sql.contains(
            "$2 IS NOT NULL AND NOT EXISTS (SELECT 1 FROM media WHERE property_id = $2),"
        ));
        // Appended after the current last image
        assert!(sql.contains("COALESCE((SELECT MAX(display_order) + 1"));
    }

    #[test]
    fn test_secondary_insert_never_claims_primary() {
        let sql = insert_sql("FALSE");
        assert!(sql.contains("$12,") && sql.contains("FALSE,"));
        assert!(!sql.contains("NOT EXISTS"));
    }

    #[test]
    fn test_primary_race_detection() {
        assert!(!lost_primary_race(&sqlx::Error::RowNotFound));
        let schema = include_str!("../../migrations/20240101000000_init.sql");
        assert!(schema.contains(ONE_PRIMARY_INDEX));
    }
}
