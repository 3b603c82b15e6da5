// src/models/user.rs
// DOCUMENTATION: User accounts, roles and auth DTOs
// PURPOSE: Maps the users table and the /auth and /admin/users payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

string_enum! {
    /// Account role; agents may list properties, admins manage everything
    Role {
        User => "user",
        Agent => "agent",
        Admin => "admin",
    }
}

/// Represents a user record from the database
/// `user_type_name` is filled by the LEFT JOIN on user_types
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub role: String,
    pub user_type_id: Option<Uuid>,
    pub avatar_url: Option<String>,
    pub is_active: bool,
    pub custom_fields: Value,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(default)]
    pub user_type_name: Option<String>,
}

/// Populated user type reference
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserTypeRef {
    pub id: Uuid,
    pub name: String,
}

/// Public view of a user; never carries the password hash
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
    pub user_type: Option<UserTypeRef>,
    pub avatar_url: Option<String>,
    pub is_active: bool,
    pub custom_fields: Value,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Stored role; the CHECK constraint keeps the column valid
    pub fn role(&self) -> Role {
        self.role.parse().unwrap_or(Role::User)
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Role::Admin
    }

    pub fn to_response(&self) -> UserResponse {
        let user_type = match (self.user_type_id, &self.user_type_name) {
            (Some(id), Some(name)) => Some(UserTypeRef {
                id,
                name: name.clone(),
            }),
            _ => None,
        };

        UserResponse {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            role: self.role(),
            user_type,
            avatar_url: self.avatar_url.clone(),
            is_active: self.is_active,
            custom_fields: self.custom_fields.clone(),
            last_login_at: self.last_login_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// POST /auth/register
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(deserialize_with = "crate::models::trim::trimmed")]
    #[validate(length(min = 2, max = 100))]
    pub name: String,

    #[serde(deserialize_with = "crate::models::trim::trimmed")]
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,

    #[serde(default, deserialize_with = "crate::models::trim::trimmed_opt")]
    #[validate(length(max = 30))]
    pub phone: Option<String>,

    /// `user` (default) or `agent`
    pub role: Option<Role>,

    pub user_type_id: Option<Uuid>,

    pub custom_fields: Option<Value>,
}

/// POST /auth/login
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(deserialize_with = "crate::models::trim::trimmed")]
    #[validate(email)]
    pub email: String,

    #[validate(length(min = 1))]
    pub password: String,
}

/// PUT /auth/me
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[serde(default, deserialize_with = "crate::models::trim::trimmed_opt")]
    #[validate(length(min = 2, max = 100))]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "crate::models::trim::trimmed_opt")]
    #[validate(length(max = 30))]
    pub phone: Option<String>,

    #[serde(default, deserialize_with = "crate::models::trim::trimmed_opt")]
    #[validate(url)]
    pub avatar_url: Option<String>,

    pub custom_fields: Option<Value>,
}

/// PUT /auth/password
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1))]
    pub current_password: String,

    #[validate(length(min = 8, max = 128))]
    pub new_password: String,
}

/// PUT /admin/users/{id}
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct AdminUpdateUserRequest {
    #[serde(default, deserialize_with = "crate::models::trim::trimmed_opt")]
    #[validate(length(min = 2, max = 100))]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "crate::models::trim::trimmed_opt")]
    #[validate(length(max = 30))]
    pub phone: Option<String>,

    pub role: Option<Role>,

    pub is_active: Option<bool>,

    pub user_type_id: Option<Uuid>,
}

/// GET /admin/users filters
#[derive(Debug, Default, Deserialize)]
pub struct UserListQuery {
    pub role: Option<Role>,
    /// Case-insensitive match on name or email
    pub q: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Token plus the account it belongs to
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

/// Agent summary embedded in listings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            name: "Dana Agent".to_string(),
            email: "dana@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            phone: None,
            role: "agent".to_string(),
            user_type_id: None,
            avatar_url: None,
            is_active: true,
            custom_fields: json!({}),
            last_login_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            user_type_name: None,
        }
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("agent".parse::<Role>(), Ok(Role::Agent));
        assert!("superuser".parse::<Role>().is_err());
        assert_eq!(Role::Admin.to_string(), "admin");
    }

    #[test]
    fn test_response_hides_password_hash() {
        let value = serde_json::to_value(sample_user().to_response()).unwrap();
        assert!(value.get("password_hash").is_none());
        assert_eq!(value["role"], "agent");
        assert_eq!(value["user_type"], serde_json::Value::Null);
    }

    #[test]
    fn test_user_type_is_populated() {
        let mut user = sample_user();
        let type_id = Uuid::new_v4();
        user.user_type_id = Some(type_id);
        user.user_type_name = Some("investor".to_string());

        let resp = user.to_response();
        assert_eq!(
            resp.user_type,
            Some(UserTypeRef {
                id: type_id,
                name: "investor".to_string()
            })
        );
    }

    #[test]
    fn test_register_validation() {
        let req: RegisterRequest = serde_json::from_value(json!({
            "name": "A",
            "email": "nope",
            "password": "short"
        }))
        .unwrap();
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("name"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
    }

    #[test]
    fn test_register_rejects_unknown_role() {
        let parsed: Result<RegisterRequest, _> = serde_json::from_value(json!({
            "name": "Sam",
            "email": "sam@example.com",
            "password": "long-enough",
            "role": "owner"
        }));
        assert!(parsed.is_err());
    }
}
