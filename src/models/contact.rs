// src/models/contact.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

string_enum! {
    /// Follow-up state of a contact request
    ContactStatus {
        Pending => "pending",
        Contacted => "contacted",
        Closed => "closed",
    }
}

/// Buyer-to-agent contact request about a listing
/// `property_title` comes from the join on properties
#[derive(Debug, Clone, FromRow)]
pub struct ContactRequest {
    pub id: Uuid,
    pub property_id: Uuid,
    pub agent_id: Uuid,
    pub user_id: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: String,
    pub status: String,
    pub custom_fields: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(default)]
    pub property_title: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContactResponse {
    pub id: Uuid,
    pub property_id: Uuid,
    pub property_title: Option<String>,
    pub agent_id: Uuid,
    pub user_id: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: String,
    pub status: String,
    pub custom_fields: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContactRequest {
    pub fn to_response(&self) -> ContactResponse {
        ContactResponse {
            id: self.id,
            property_id: self.property_id,
            property_title: self.property_title.clone(),
            agent_id: self.agent_id,
            user_id: self.user_id,
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            message: self.message.clone(),
            status: self.status.clone(),
            custom_fields: self.custom_fields.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// POST /contacts
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateContactRequest {
    pub property_id: Uuid,

    #[serde(deserialize_with = "crate::models::trim::trimmed")]
    #[validate(length(min = 2, max = 100))]
    pub name: String,

    #[serde(deserialize_with = "crate::models::trim::trimmed")]
    #[validate(email)]
    pub email: String,

    #[serde(default, deserialize_with = "crate::models::trim::trimmed_opt")]
    #[validate(length(max = 30))]
    pub phone: Option<String>,

    #[serde(deserialize_with = "crate::models::trim::trimmed")]
    #[validate(length(min = 10, max = 2000))]
    pub message: String,

    pub custom_fields: Option<Value>,
}

/// PUT /contacts/{id}/status
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateContactStatusRequest {
    pub status: ContactStatus,
}

/// GET /contacts filters
#[derive(Debug, Default, Deserialize)]
pub struct ContactListQuery {
    pub status: Option<ContactStatus>,
    pub property_id: Option<Uuid>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
