// src/models/user_type.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Admin-managed classification of users (buyer, seller, investor, ...)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserType {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUserTypeRequest {
    #[serde(deserialize_with = "crate::models::trim::trimmed")]
    #[validate(length(min = 1, max = 50))]
    pub name: String,

    #[serde(default, deserialize_with = "crate::models::trim::trimmed_opt")]
    #[validate(length(max = 500))]
    pub description: Option<String>,

    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateUserTypeRequest {
    #[serde(default, deserialize_with = "crate::models::trim::trimmed_opt")]
    #[validate(length(min = 1, max = 50))]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "crate::models::trim::trimmed_opt")]
    #[validate(length(max = 500))]
    pub description: Option<String>,

    pub is_active: Option<bool>,
}
