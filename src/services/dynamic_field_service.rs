// src/services/dynamic_field_service.rs
// DOCUMENTATION: Validation of `custom_fields` payloads
// PURPOSE: Check submitted values against the active field definitions of an
// entity type before they reach the JSONB column

use crate::db::DynamicFieldRepository;
use crate::errors::AppError;
use crate::models::{DynamicField, EntityType, FieldType};
use chrono::NaiveDate;
use serde_json::{Map, Value};
use sqlx::PgPool;

pub struct DynamicFieldService;

impl DynamicFieldService {
    /// Load the active definitions for `entity` and validate `values` against them
    pub async fn validate_for(
        pool: &PgPool,
        entity: EntityType,
        values: Option<&Value>,
    ) -> Result<Value, AppError> {
        let fields = DynamicFieldRepository::list(pool, Some(entity), true).await?;
        validate_custom_fields(&fields, values).map(Value::Object)
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn check_value(field: &DynamicField, value: &Value) -> Result<(), String> {
    let name = &field.name;
    match field.field_type() {
        FieldType::Text | FieldType::Textarea => {
            if value.is_string() {
                Ok(())
            } else {
                Err(format!("{} must be text", name))
            }
        }
        FieldType::Number => {
            if value.is_number() {
                Ok(())
            } else {
                Err(format!("{} must be a number", name))
            }
        }
        FieldType::Checkbox => {
            if value.is_boolean() {
                Ok(())
            } else {
                Err(format!("{} must be true or false", name))
            }
        }
        FieldType::Date => match value.as_str() {
            Some(s) if NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok() => Ok(()),
            _ => Err(format!("{} must be a date (YYYY-MM-DD)", name)),
        },
        FieldType::Select => match value.as_str() {
            Some(s) if field.options.iter().any(|o| o == s) => Ok(()),
            _ => Err(format!(
                "{} must be one of: {}",
                name,
                field.options.join(", ")
            )),
        },
    }
}

/// Validate a `custom_fields` object against field definitions
///
/// Missing or null input is treated as an empty object. Every problem is
/// collected so the client sees all of them at once. Blank optional values
/// are dropped from the stored object.
pub fn validate_custom_fields(
    fields: &[DynamicField],
    values: Option<&Value>,
) -> Result<Map<String, Value>, AppError> {
    let empty = Map::new();
    let submitted = match values {
        None | Some(Value::Null) => &empty,
        Some(Value::Object(map)) => map,
        Some(_) => {
            return Err(AppError::ValidationError(
                "custom_fields must be an object".to_string(),
            ))
        }
    };

    let mut errors = Vec::new();
    let mut accepted = Map::new();

    let mut unknown: Vec<&String> = submitted
        .keys()
        .filter(|key| !fields.iter().any(|f| &f.name == *key))
        .collect();
    unknown.sort();
    for key in unknown {
        errors.push(format!("{} is not a recognised field", key));
    }

    for field in fields {
        match submitted.get(&field.name) {
            Some(value) if !is_blank(value) => match check_value(field, value) {
                Ok(()) => {
                    accepted.insert(field.name.clone(), value.clone());
                }
                Err(msg) => errors.push(msg),
            },
            _ if field.required => errors.push(format!("{} is required", field.name)),
            _ => {}
        }
    }

    if errors.is_empty() {
        Ok(accepted)
    } else {
        Err(AppError::ValidationError(errors.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    fn field(name: &str, field_type: FieldType, required: bool, options: &[&str]) -> DynamicField {
        DynamicField {
            id: Uuid::new_v4(),
            entity_type: "property".to_string(),
            name: name.to_string(),
            label: name.to_string(),
            field_type: field_type.as_str().to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            required,
            display_order: 0,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn definitions() -> Vec<DynamicField> {
        vec![
            field("hoa_fee", FieldType::Number, true, &[]),
            field("heating", FieldType::Select, false, &["gas", "electric"]),
            field("pets_allowed", FieldType::Checkbox, false, &[]),
            field("available_from", FieldType::Date, false, &[]),
            field("notes", FieldType::Textarea, false, &[]),
        ]
    }

    fn message(err: AppError) -> String {
        match err {
            AppError::ValidationError(msg) => msg,
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_valid_payload_is_accepted() {
        let values = json!({
            "hoa_fee": 250,
            "heating": "gas",
            "pets_allowed": true,
            "available_from": "2024-06-01",
            "notes": ""
        });
        let accepted = validate_custom_fields(&definitions(), Some(&values)).unwrap();
        assert_eq!(accepted.get("hoa_fee"), Some(&json!(250)));
        // Blank optional values are not stored
        assert!(!accepted.contains_key("notes"));
    }

    #[test]
    fn test_missing_required_field() {
        let err = validate_custom_fields(&definitions(), None).unwrap_err();
        assert_eq!(message(err), "hoa_fee is required");
    }

    #[test]
    fn test_all_errors_are_reported() {
        let values = json!({
            "hoa_fee": "cheap",
            "heating": "coal",
            "pets_allowed": "yes",
            "available_from": "06/01/2024",
            "pool": true
        });
        let msg = message(validate_custom_fields(&definitions(), Some(&values)).unwrap_err());
        assert!(msg.contains("pool is not a recognised field"));
        assert!(msg.contains("hoa_fee must be a number"));
        assert!(msg.contains("heating must be one of: gas, electric"));
        assert!(msg.contains("pets_allowed must be true or false"));
        assert!(msg.contains("available_from must be a date"));
    }

    #[test]
    fn test_non_object_is_rejected() {
        let err = validate_custom_fields(&definitions(), Some(&json!([1, 2]))).unwrap_err();
        assert_eq!(message(err), "custom_fields must be an object");
    }

    #[test]
    fn test_no_definitions_accepts_only_empty() {
        assert!(validate_custom_fields(&[], Some(&json!({}))).unwrap().is_empty());
        assert!(validate_custom_fields(&[], Some(&json!({ "x": 1 }))).is_err());
    }
}
