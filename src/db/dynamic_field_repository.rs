// src/db/dynamic_field_repository.rs
// DOCUMENTATION: SQL for admin-defined dynamic fields

use crate::errors::AppError;
use crate::models::*;
use sqlx::PgPool;
use uuid::Uuid;

pub struct DynamicFieldRepository;

impl DynamicFieldRepository {
    /// Fields ordered for form rendering
    /// `entity = None` returns every entity type
    pub async fn list(
        pool: &PgPool,
        entity: Option<EntityType>,
        active_only: bool,
    ) -> Result<Vec<DynamicField>, AppError> {
        let fields = sqlx::query_as::<_, DynamicField>(
            r#"
            SELECT * FROM dynamic_fields
            WHERE ($1::text IS NULL OR entity_type = $1)
              AND ($2 = false OR is_active = true)
            ORDER BY entity_type ASC, display_order ASC, name ASC
            "#,
        )
        .bind(entity.map(|e| e.as_str()))
        .bind(active_only)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to load dynamic fields: {}", e);
            AppError::from(e)
        })?;
        Ok(fields)
    }

    pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<DynamicField, AppError> {
        sqlx::query_as::<_, DynamicField>("SELECT * FROM dynamic_fields WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Dynamic field not found with id of {}", id)))
    }

    pub async fn create(
        pool: &PgPool,
        req: &CreateDynamicFieldRequest,
    ) -> Result<DynamicField, AppError> {
        let field = sqlx::query_as::<_, DynamicField>(
            r#"
            INSERT INTO dynamic_fields (
                id, entity_type, name, label, field_type, options,
                required, display_order, is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(req.entity_type.as_str())
        .bind(&req.name)
        .bind(req.label.trim())
        .bind(req.field_type.as_str())
        .bind(&req.options)
        .bind(req.required)
        .bind(req.display_order)
        .bind(req.is_active.unwrap_or(true))
        .fetch_one(pool)
        .await?;

        log::info!(
            "Created dynamic field {}.{} ({})",
            field.entity_type,
            field.name,
            field.field_type
        );
        Ok(field)
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        req: &UpdateDynamicFieldRequest,
    ) -> Result<DynamicField, AppError> {
        sqlx::query_as::<_, DynamicField>(
            r#"
            UPDATE dynamic_fields SET
                label = COALESCE($2, label),
                field_type = COALESCE($3, field_type),
                options = COALESCE($4, options),
                required = COALESCE($5, required),
                display_order = COALESCE($6, display_order),
                is_active = COALESCE($7, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(req.label.as_deref().map(str::trim))
        .bind(req.field_type.map(|t| t.as_str()))
        .bind(&req.options)
        .bind(req.required)
        .bind(req.display_order)
        .bind(req.is_active)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Dynamic field not found with id of {}", id)))
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM dynamic_fields WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Dynamic field not found with id of {}", id)));
        }

        log::info!("Deleted dynamic field {}", id);
        Ok(())
    }
}
