// src/models/dynamic_field.rs
// DOCUMENTATION: Admin-configurable extra form fields
// PURPOSE: Field definitions attached to an entity type; values live in
// the `custom_fields` JSONB column of that entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

string_enum! {
    /// Entity a dynamic field is attached to
    EntityType {
        Property => "property",
        User => "user",
        ContactRequest => "contact_request",
        Inquiry => "inquiry",
    }
}

string_enum! {
    /// Input widget and value type of a dynamic field
    FieldType {
        Text => "text",
        Textarea => "textarea",
        Number => "number",
        Select => "select",
        Checkbox => "checkbox",
        Date => "date",
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DynamicField {
    pub id: Uuid,
    pub entity_type: String,
    pub name: String,
    pub label: String,
    pub field_type: String,
    pub options: Vec<String>,
    pub required: bool,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DynamicFieldResponse {
    pub id: Uuid,
    pub entity_type: String,
    pub name: String,
    pub label: String,
    pub field_type: String,
    pub options: Vec<String>,
    pub required: bool,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DynamicField {
    pub fn field_type(&self) -> FieldType {
        self.field_type.parse().unwrap_or(FieldType::Text)
    }

    pub fn to_response(&self) -> DynamicFieldResponse {
        DynamicFieldResponse {
            id: self.id,
            entity_type: self.entity_type.clone(),
            name: self.name.clone(),
            label: self.label.clone(),
            field_type: self.field_type.clone(),
            options: self.options.clone(),
            required: self.required,
            display_order: self.display_order,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Field keys: lowercase ascii, digits and underscores, starting with a letter
pub fn validate_field_name(name: &str) -> Result<(), ValidationError> {
    let mut chars = name.chars();
    let starts_with_letter = chars.next().map(|c| c.is_ascii_lowercase()).unwrap_or(false);
    let rest_ok = chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');

    if starts_with_letter && rest_ok {
        Ok(())
    } else {
        Err(ValidationError::new("field_name"))
    }
}

/// POST /admin/dynamic-fields
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateDynamicFieldRequest {
    pub entity_type: EntityType,

    #[serde(deserialize_with = "crate::models::trim::trimmed")]
    #[validate(length(min = 1, max = 50), custom = "validate_field_name")]
    pub name: String,

    #[serde(deserialize_with = "crate::models::trim::trimmed")]
    #[validate(length(min = 1, max = 100))]
    pub label: String,

    pub field_type: FieldType,

    #[serde(default)]
    pub options: Vec<String>,

    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub display_order: i32,

    pub is_active: Option<bool>,
}

/// PUT /admin/dynamic-fields/{id}
/// The key and entity type are fixed once created
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateDynamicFieldRequest {
    #[serde(default, deserialize_with = "crate::models::trim::trimmed_opt")]
    #[validate(length(min = 1, max = 100))]
    pub label: Option<String>,

    pub field_type: Option<FieldType>,

    pub options: Option<Vec<String>>,

    pub required: Option<bool>,

    pub display_order: Option<i32>,

    pub is_active: Option<bool>,
}

/// `?entity_type=` filter
#[derive(Debug, Default, Deserialize)]
pub struct DynamicFieldQuery {
    pub entity_type: Option<EntityType>,
}
