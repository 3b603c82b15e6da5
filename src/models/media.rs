// src/models/media.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// MIME types accepted by the upload endpoint
pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "image/gif"];

/// Uploaded image hosted on the external image CDN
#[derive(Debug, Clone, FromRow)]
pub struct Media {
    pub id: Uuid,
    pub property_id: Option<Uuid>,
    pub uploaded_by: Uuid,
    pub url: String,
    pub thumbnail_url: Option<String>,
    pub delete_url: Option<String>,
    pub provider_id: Option<String>,
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub is_primary: bool,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row to insert after the image host accepted an upload
#[derive(Debug, Clone)]
pub struct NewMedia {
    pub property_id: Option<Uuid>,
    pub uploaded_by: Uuid,
    pub url: String,
    pub thumbnail_url: Option<String>,
    pub delete_url: Option<String>,
    pub provider_id: Option<String>,
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub width: Option<i32>,
    pub height: Option<i32>,
}

/// Media DTO for API responses
#[derive(Debug, Clone, Serialize)]
pub struct MediaResponse {
    pub id: Uuid,
    pub property_id: Option<Uuid>,
    pub url: String,
    pub thumbnail_url: Option<String>,
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub is_primary: bool,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
}

impl Media {
    /// Convert database media into API response DTO
    /// The provider delete URL stays server side
    pub fn to_response(&self) -> MediaResponse {
        MediaResponse {
            id: self.id,
            property_id: self.property_id,
            url: self.url.clone(),
            thumbnail_url: self.thumbnail_url.clone(),
            file_name: self.file_name.clone(),
            mime_type: self.mime_type.clone(),
            size_bytes: self.size_bytes,
            width: self.width,
            height: self.height,
            is_primary: self.is_primary,
            display_order: self.display_order,
            created_at: self.created_at,
        }
    }
}

pub fn is_allowed_image_type(mime_type: &str) -> bool {
    ALLOWED_IMAGE_TYPES
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(mime_type))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_image_types() {
        assert!(is_allowed_image_type("image/png"));
        assert!(is_allowed_image_type("IMAGE/JPEG"));
        assert!(!is_allowed_image_type("application/pdf"));
        assert!(!is_allowed_image_type("image/svg+xml"));
    }
}
