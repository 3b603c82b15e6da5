// src/db/user_repository.rs
// DOCUMENTATION: SQL for the users table
// PURPOSE: Account lookup for auth plus the admin user console

use crate::errors::AppError;
use crate::models::*;
use serde_json::Value;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

const SELECT_USER: &str = r#"
    SELECT u.*, ut.name AS user_type_name
    FROM users u
    LEFT JOIN user_types ut ON ut.id = u.user_type_id
"#;

/// Insert payload for a new account
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub phone: Option<&'a str>,
    pub role: Role,
    pub user_type_id: Option<Uuid>,
    pub custom_fields: Value,
}

pub struct UserRepository;

impl UserRepository {
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, AppError> {
        let sql = format!("{} WHERE u.id = $1", SELECT_USER);
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(|e| {
                log::error!("Failed to load user {}: {}", id, e);
                AppError::from(e)
            })
    }

    pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<User, AppError> {
        Self::find_by_id(pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User not found with id of {}", id)))
    }

    /// Emails are stored lowercased
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, AppError> {
        let sql = format!("{} WHERE u.email = $1", SELECT_USER);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email.trim().to_lowercase())
            .fetch_optional(pool)
            .await?;
        Ok(user)
    }

    pub async fn create(pool: &PgPool, new_user: &NewUser<'_>) -> Result<User, AppError> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO users (
                id, name, email, password_hash, phone, role, user_type_id, custom_fields
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(id)
        .bind(new_user.name.trim())
        .bind(new_user.email.trim().to_lowercase())
        .bind(new_user.password_hash)
        .bind(new_user.phone)
        .bind(new_user.role.as_str())
        .bind(new_user.user_type_id)
        .bind(&new_user.custom_fields)
        .execute(pool)
        .await
        .map_err(|e| {
            log::warn!("Failed to create user {}: {}", new_user.email, e);
            AppError::from(e)
        })?;

        log::info!("Created {} account {}", new_user.role, id);
        Self::get_by_id(pool, id).await
    }

    pub async fn update_profile(
        pool: &PgPool,
        id: Uuid,
        req: &UpdateProfileRequest,
        custom_fields: Option<Value>,
    ) -> Result<User, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE users SET
                name = COALESCE($2, name),
                phone = COALESCE($3, phone),
                avatar_url = COALESCE($4, avatar_url),
                custom_fields = COALESCE($5, custom_fields),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(req.name.as_deref().map(str::trim))
        .bind(&req.phone)
        .bind(&req.avatar_url)
        .bind(custom_fields)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User not found with id of {}", id)));
        }
        Self::get_by_id(pool, id).await
    }

    pub async fn update_password(
        pool: &PgPool,
        id: Uuid,
        password_hash: &str,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn touch_last_login(pool: &PgPool, id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn admin_update(
        pool: &PgPool,
        id: Uuid,
        req: &AdminUpdateUserRequest,
    ) -> Result<User, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE users SET
                name = COALESCE($2, name),
                phone = COALESCE($3, phone),
                role = COALESCE($4, role),
                is_active = COALESCE($5, is_active),
                user_type_id = COALESCE($6, user_type_id),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(req.name.as_deref().map(str::trim))
        .bind(&req.phone)
        .bind(req.role.map(|r| r.as_str()))
        .bind(req.is_active)
        .bind(req.user_type_id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User not found with id of {}", id)));
        }

        log::info!("Admin updated user {}", id);
        Self::get_by_id(pool, id).await
    }

    pub async fn list(
        pool: &PgPool,
        query: &UserListQuery,
        page: Page,
    ) -> Result<(Vec<User>, i64), AppError> {
        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users u WHERE 1 = 1");
        push_user_filters(&mut count_qb, query);
        let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

        let mut qb = QueryBuilder::<Postgres>::new(SELECT_USER);
        qb.push(" WHERE 1 = 1");
        push_user_filters(&mut qb, query);
        qb.push(" ORDER BY u.created_at DESC, u.id ASC LIMIT ");
        qb.push_bind(page.limit);
        qb.push(" OFFSET ");
        qb.push_bind(page.offset());

        let users = qb.build_query_as::<User>().fetch_all(pool).await.map_err(|e| {
            log::error!("Failed to list users: {}", e);
            AppError::from(e)
        })?;

        Ok((users, total))
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User not found with id of {}", id)));
        }

        log::info!("Deleted user {}", id);
        Ok(())
    }

    pub async fn count_by_role(pool: &PgPool) -> Result<Vec<(String, i64)>, AppError> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            "SELECT role, COUNT(*) FROM users GROUP BY role ORDER BY role",
        )
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }
}

fn push_user_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &UserListQuery) {
    if let Some(role) = query.role {
        qb.push(" AND u.role = ");
        qb.push_bind(role.as_str());
    }

    if let Some(q) = query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        let pattern = format!("%{}%", q.replace('%', "\\%").replace('_', "\\_"));
        qb.push(" AND (u.name ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR u.email ILIKE ");
        qb.push_bind(pattern);
        qb.push(")");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_filters_bind_values() {
        let query = UserListQuery {
            role: Some(Role::Agent),
            q: Some(" dana ".to_string()),
            ..Default::default()
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users u WHERE 1 = 1");
        push_user_filters(&mut qb, &query);

        assert_eq!(
            qb.sql(),
            "SELECT COUNT(*) FROM users u WHERE 1 = 1 AND u.role = $1 AND (u.name ILIKE $2 OR u.email ILIKE $3)"
        );
    }

    #[test]
    fn test_blank_search_is_ignored() {
        let query = UserListQuery {
            q: Some("   ".to_string()),
            ..Default::default()
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 FROM users u WHERE 1 = 1");
        push_user_filters(&mut qb, &query);
        assert_eq!(qb.sql(), "SELECT 1 FROM users u WHERE 1 = 1");
    }
}
