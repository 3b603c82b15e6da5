// src/db/user_type_repository.rs
// DOCUMENTATION: SQL for the user_types lookup table

use crate::errors::AppError;
use crate::models::*;
use sqlx::PgPool;
use uuid::Uuid;

pub struct UserTypeRepository;

impl UserTypeRepository {
    pub async fn list(pool: &PgPool, active_only: bool) -> Result<Vec<UserType>, AppError> {
        let types = sqlx::query_as::<_, UserType>(
            r#"
            SELECT * FROM user_types
            WHERE ($1 = false OR is_active = true)
            ORDER BY name ASC
            "#,
        )
        .bind(active_only)
        .fetch_all(pool)
        .await?;
        Ok(types)
    }

    pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<UserType, AppError> {
        sqlx::query_as::<_, UserType>("SELECT * FROM user_types WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User type not found with id of {}", id)))
    }

    /// Active type lookup used when users pick a type at registration
    pub async fn ensure_active(pool: &PgPool, id: Uuid) -> Result<(), AppError> {
        let user_type = Self::get_by_id(pool, id).await.map_err(|_| {
            AppError::InvalidInput(format!("Unknown user type {}", id))
        })?;
        if !user_type.is_active {
            return Err(AppError::InvalidInput(format!(
                "User type {} is not available",
                user_type.name
            )));
        }
        Ok(())
    }

    pub async fn create(pool: &PgPool, req: &CreateUserTypeRequest) -> Result<UserType, AppError> {
        let user_type = sqlx::query_as::<_, UserType>(
            r#"
            INSERT INTO user_types (id, name, description, is_active)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(req.name.trim())
        .bind(&req.description)
        .bind(req.is_active.unwrap_or(true))
        .fetch_one(pool)
        .await?;

        log::info!("Created user type {}", user_type.name);
        Ok(user_type)
    }

    /// Insert unless a type with that name already exists
    pub async fn ensure_exists(
        pool: &PgPool,
        name: &str,
        description: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            INSERT INTO user_types (id, name, description)
            VALUES ($1, $2, $3)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(description)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        req: &UpdateUserTypeRequest,
    ) -> Result<UserType, AppError> {
        sqlx::query_as::<_, UserType>(
            r#"
            UPDATE user_types SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                is_active = COALESCE($4, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(req.name.as_deref().map(str::trim))
        .bind(&req.description)
        .bind(req.is_active)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User type not found with id of {}", id)))
    }

    /// Types still assigned to users cannot be removed
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), AppError> {
        let (in_use,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM users WHERE user_type_id = $1")
                .bind(id)
                .fetch_one(pool)
                .await?;

        if in_use > 0 {
            return Err(AppError::InvalidInput(format!(
                "User type is assigned to {} user(s) and cannot be deleted",
                in_use
            )));
        }

        let result = sqlx::query("DELETE FROM user_types WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User type not found with id of {}", id)));
        }

        log::info!("Deleted user type {}", id);
        Ok(())
    }
}
