// src/db/contact_repository.rs
// DOCUMENTATION: SQL for contact requests

use crate::errors::AppError;
use crate::models::*;
use crate::services::ListScope;
use serde_json::Value;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

const SELECT_CONTACT: &str = r#"
    SELECT c.*, p.title AS property_title
    FROM contact_requests c
    JOIN properties p ON p.id = c.property_id
"#;

pub struct ContactRepository;

impl ContactRepository {
    pub async fn create(
        pool: &PgPool,
        req: &CreateContactRequest,
        agent_id: Uuid,
        user_id: Option<Uuid>,
        custom_fields: &Value,
    ) -> Result<ContactRequest, AppError> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO contact_requests (
                id, property_id, agent_id, user_id, name, email, phone, message, custom_fields
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(id)
        .bind(req.property_id)
        .bind(agent_id)
        .bind(user_id)
        .bind(req.name.trim())
        .bind(req.email.trim().to_lowercase())
        .bind(&req.phone)
        .bind(req.message.trim())
        .bind(custom_fields)
        .execute(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to create contact request: {}", e);
            AppError::from(e)
        })?;

        log::info!("Contact request {} sent for property {}", id, req.property_id);
        Self::get_by_id(pool, id).await
    }

    pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<ContactRequest, AppError> {
        let sql = format!("{} WHERE c.id = $1", SELECT_CONTACT);
        sqlx::query_as::<_, ContactRequest>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Contact request not found with id of {}", id)))
    }

    pub async fn list(
        pool: &PgPool,
        scope: ListScope,
        query: &ContactListQuery,
        page: Page,
    ) -> Result<(Vec<ContactRequest>, i64), AppError> {
        let mut count_qb = QueryBuilder::<Postgres>::new(
            "SELECT COUNT(*) FROM contact_requests c WHERE 1 = 1",
        );
        push_contact_filters(&mut count_qb, scope, query);
        let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

        let mut qb = QueryBuilder::<Postgres>::new(SELECT_CONTACT);
        qb.push(" WHERE 1 = 1");
        push_contact_filters(&mut qb, scope, query);
        qb.push(" ORDER BY c.created_at DESC, c.id ASC LIMIT ");
        qb.push_bind(page.limit);
        qb.push(" OFFSET ");
        qb.push_bind(page.offset());

        let contacts = qb
            .build_query_as::<ContactRequest>()
            .fetch_all(pool)
            .await
            .map_err(|e| {
                log::error!("Failed to list contact requests: {}", e);
                AppError::from(e)
            })?;

        Ok((contacts, total))
    }

    pub async fn update_status(
        pool: &PgPool,
        id: Uuid,
        status: ContactStatus,
    ) -> Result<ContactRequest, AppError> {
        let result = sqlx::query(
            "UPDATE contact_requests SET status = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(status.as_str())
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Contact request not found with id of {}", id)));
        }

        log::info!("Contact request {} marked {}", id, status);
        Self::get_by_id(pool, id).await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM contact_requests WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Contact request not found with id of {}", id)));
        }
        Ok(())
    }

    pub async fn count_by_status(pool: &PgPool) -> Result<Vec<(String, i64)>, AppError> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            "SELECT status, COUNT(*) FROM contact_requests GROUP BY status ORDER BY status",
        )
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }
}

fn push_contact_filters(
    qb: &mut QueryBuilder<'_, Postgres>,
    scope: ListScope,
    query: &ContactListQuery,
) {
    match scope {
        ListScope::All => {}
        ListScope::Agent(agent_id) => {
            qb.push(" AND c.agent_id = ");
            qb.push_bind(agent_id);
        }
        ListScope::Sender(user_id) => {
            qb.push(" AND c.user_id = ");
            qb.push_bind(user_id);
        }
    }

    if let Some(status) = query.status {
        qb.push(" AND c.status = ");
        qb.push_bind(status.as_str());
    }

    if let Some(property_id) = query.property_id {
        qb.push(" AND c.property_id = ");
        qb.push_bind(property_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_scope_with_filters() {
        let query = ContactListQuery {
            status: Some(ContactStatus::Pending),
            property_id: Some(Uuid::new_v4()),
            ..Default::default()
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM contact_requests c WHERE 1 = 1");
        push_contact_filters(&mut qb, ListScope::Agent(Uuid::new_v4()), &query);

        assert_eq!(
            qb.sql(),
            "SELECT COUNT(*) FROM contact_requests c WHERE 1 = 1 AND c.agent_id = $1 AND c.status = $2 AND c.property_id = $3"
        );
    }

    #[test]
    fn test_admin_scope_is_unrestricted() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 FROM contact_requests c WHERE 1 = 1");
        push_contact_filters(&mut qb, ListScope::All, &ContactListQuery::default());
        assert_eq!(qb.sql(), "SELECT 1 FROM contact_requests c WHERE 1 = 1");
    }
}
