// src/db/inquiry_repository.rs
// DOCUMENTATION: SQL for inquiries and agent responses

use crate::errors::AppError;
use crate::models::*;
use crate::services::{ensure_inquiry_open, ListScope};
use serde_json::Value;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

const SELECT_INQUIRY: &str = r#"
    SELECT
        i.*,
        p.title AS property_title,
        u.name AS user_name,
        u.email AS user_email
    FROM inquiries i
    JOIN properties p ON p.id = i.property_id
    JOIN users u ON u.id = i.user_id
"#;

pub struct InquiryRepository;

impl InquiryRepository {
    pub async fn create(
        pool: &PgPool,
        req: &CreateInquiryRequest,
        agent_id: Uuid,
        user_id: Uuid,
        custom_fields: &Value,
    ) -> Result<Inquiry, AppError> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO inquiries (
                id, property_id, agent_id, user_id, subject, message, custom_fields
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(id)
        .bind(req.property_id)
        .bind(agent_id)
        .bind(user_id)
        .bind(req.subject.trim())
        .bind(req.message.trim())
        .bind(custom_fields)
        .execute(pool)
        .await
        .map_err(|e| {
            log::error!("Failed to create inquiry: {}", e);
            AppError::from(e)
        })?;

        log::info!("Inquiry {} opened on property {}", id, req.property_id);
        Self::get_by_id(pool, id).await
    }

    pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<Inquiry, AppError> {
        let sql = format!("{} WHERE i.id = $1", SELECT_INQUIRY);
        sqlx::query_as::<_, Inquiry>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Inquiry not found with id of {}", id)))
    }

    pub async fn list(
        pool: &PgPool,
        scope: ListScope,
        query: &InquiryListQuery,
        page: Page,
    ) -> Result<(Vec<Inquiry>, i64), AppError> {
        let mut count_qb =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM inquiries i WHERE 1 = 1");
        push_inquiry_filters(&mut count_qb, scope, query);
        let total: i64 = count_qb.build_query_scalar().fetch_one(pool).await?;

        let mut qb = QueryBuilder::<Postgres>::new(SELECT_INQUIRY);
        qb.push(" WHERE 1 = 1");
        push_inquiry_filters(&mut qb, scope, query);
        qb.push(" ORDER BY i.created_at DESC, i.id ASC LIMIT ");
        qb.push_bind(page.limit);
        qb.push(" OFFSET ");
        qb.push_bind(page.offset());

        let inquiries = qb.build_query_as::<Inquiry>().fetch_all(pool).await?;
        Ok((inquiries, total))
    }

    /// Store the agent's answer
    /// Closed inquiries are left untouched
    pub async fn respond(pool: &PgPool, id: Uuid, response: &str) -> Result<Inquiry, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE inquiries SET
                response = $2,
                responded_at = NOW(),
                status = 'responded',
                updated_at = NOW()
            WHERE id = $1 AND status <> 'closed'
            "#,
        )
        .bind(id)
        .bind(response.trim())
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            let existing = Self::get_by_id(pool, id).await?;
            ensure_inquiry_open(existing.status())?;
        }

        log::info!("Inquiry {} responded", id);
        Self::get_by_id(pool, id).await
    }

    pub async fn update_status(
        pool: &PgPool,
        id: Uuid,
        status: InquiryStatus,
    ) -> Result<Inquiry, AppError> {
        let result =
            sqlx::query("UPDATE inquiries SET status = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(status.as_str())
                .execute(pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Inquiry not found with id of {}", id)));
        }

        log::info!("Inquiry {} marked {}", id, status);
        Self::get_by_id(pool, id).await
    }

    pub async fn count_by_status(pool: &PgPool) -> Result<Vec<(String, i64)>, AppError> {
        let rows = sqlx::query_as::<_, (String, i64)>(
            "SELECT status, COUNT(*) FROM inquiries GROUP BY status ORDER BY status",
        )
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }
}

fn push_inquiry_filters(
    qb: &mut QueryBuilder<'_, Postgres>,
    scope: ListScope,
    query: &InquiryListQuery,
) {
    match scope {
        ListScope::All => {}
        ListScope::Agent(agent_id) => {
            qb.push(" AND i.agent_id = ");
            qb.push_bind(agent_id);
        }
        ListScope::Sender(user_id) => {
            qb.push(" AND i.user_id = ");
            qb.push_bind(user_id);
        }
    }

    if let Some(status) = query.status {
        qb.push(" AND i.status = ");
        qb.push_bind(status.as_str());
    }

    if let Some(property_id) = query.property_id {
        qb.push(" AND i.property_id = ");
        qb.push_bind(property_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_scope() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 FROM inquiries i WHERE 1 = 1");
        let query = InquiryListQuery {
            status: Some(InquiryStatus::Open),
            ..Default::default()
        };
        push_inquiry_filters(&mut qb, ListScope::Sender(Uuid::new_v4()), &query);
        assert_eq!(
            qb.sql(),
            "SELECT 1 FROM inquiries i WHERE 1 = 1 AND i.user_id = $1 AND i.status = $2"
        );
    }
}
