// src/models/inquiry.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

string_enum! {
    /// Conversation state of an inquiry
    InquiryStatus {
        Open => "open",
        Responded => "responded",
        Closed => "closed",
    }
}

/// Authenticated question from a user to the listing agent
#[derive(Debug, Clone, FromRow)]
pub struct Inquiry {
    pub id: Uuid,
    pub property_id: Uuid,
    pub agent_id: Uuid,
    pub user_id: Uuid,
    pub subject: String,
    pub message: String,
    pub response: Option<String>,
    pub responded_at: Option<DateTime<Utc>>,
    pub status: String,
    pub custom_fields: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(default)]
    pub property_title: Option<String>,
    #[sqlx(default)]
    pub user_name: Option<String>,
    #[sqlx(default)]
    pub user_email: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InquiryResponse {
    pub id: Uuid,
    pub property_id: Uuid,
    pub property_title: Option<String>,
    pub agent_id: Uuid,
    pub user_id: Uuid,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub subject: String,
    pub message: String,
    pub response: Option<String>,
    pub responded_at: Option<DateTime<Utc>>,
    pub status: String,
    pub custom_fields: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Inquiry {
    pub fn status(&self) -> InquiryStatus {
        self.status.parse().unwrap_or(InquiryStatus::Open)
    }

    pub fn to_response(&self) -> InquiryResponse {
        InquiryResponse {
            id: self.id,
            property_id: self.property_id,
            property_title: self.property_title.clone(),
            agent_id: self.agent_id,
            user_id: self.user_id,
            user_name: self.user_name.clone(),
            user_email: self.user_email.clone(),
            subject: self.subject.clone(),
            message: self.message.clone(),
            response: self.response.clone(),
            responded_at: self.responded_at,
            status: self.status.clone(),
            custom_fields: self.custom_fields.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// POST /inquiries
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateInquiryRequest {
    pub property_id: Uuid,

    #[serde(deserialize_with = "crate::models::trim::trimmed")]
    #[validate(length(min = 3, max = 200))]
    pub subject: String,

    #[serde(deserialize_with = "crate::models::trim::trimmed")]
    #[validate(length(min = 10, max = 5000))]
    pub message: String,

    pub custom_fields: Option<Value>,
}

/// POST /inquiries/{id}/respond
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RespondInquiryRequest {
    #[serde(deserialize_with = "crate::models::trim::trimmed")]
    #[validate(length(min = 1, max = 5000))]
    pub response: String,
}

/// PUT /inquiries/{id}/status
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateInquiryStatusRequest {
    pub status: InquiryStatus,
}

/// GET /inquiries filters
#[derive(Debug, Default, Deserialize)]
pub struct InquiryListQuery {
    pub status: Option<InquiryStatus>,
    pub property_id: Option<Uuid>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_request_carries_custom_fields() {
        let req: CreateInquiryRequest = serde_json::from_value(json!({
            "property_id": Uuid::new_v4(),
            "subject": "  Viewing  ",
            "message": "Could I see the house this weekend?",
            "custom_fields": { "preferred_contact": "phone" }
        }))
        .unwrap();

        assert_eq!(req.subject, "Viewing");
        assert_eq!(req.custom_fields, Some(json!({ "preferred_contact": "phone" })));
        assert!(req.validate().is_ok());

        let bare: CreateInquiryRequest = serde_json::from_value(json!({
            "property_id": Uuid::new_v4(),
            "subject": "Viewing",
            "message": "Could I see the house this weekend?"
        }))
        .unwrap();
        assert!(bare.custom_fields.is_none());
    }

    #[test]
    fn test_response_includes_custom_fields() {
        let inquiry = Inquiry {
            id: Uuid::new_v4(),
            property_id: Uuid::new_v4(),
            agent_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            subject: "Viewing".to_string(),
            message: "Could I see the house this weekend?".to_string(),
            response: None,
            responded_at: None,
            status: "open".to_string(),
            custom_fields: json!({ "preferred_contact": "email" }),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            property_title: None,
            user_name: None,
            user_email: None,
        };

        let value = serde_json::to_value(inquiry.to_response()).unwrap();
        assert_eq!(value["custom_fields"]["preferred_contact"], "email");
        assert_eq!(inquiry.status(), InquiryStatus::Open);
    }
}
