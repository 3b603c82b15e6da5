// src/handlers/media.rs
// DOCUMENTATION: HTTP handlers for listing images
// PURPOSE: Multipart upload proxied to the image host, plus ordering and removal

use crate::config::Config;
use crate::db::{MediaRepository, PropertyRepository};
use crate::errors::AppError;
use crate::middleware::AuthUser;
use crate::models::{is_allowed_image_type, ApiResponse, NewMedia, ALLOWED_IMAGE_TYPES};
use crate::services::{ensure_owner_or_admin, ImageHostClient};
use actix_multipart::{Field, Multipart};
use actix_web::{web, HttpResponse, Responder};
use futures_util::StreamExt;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

/// Longest accepted value for plain text form fields
const MAX_TEXT_FIELD_BYTES: usize = 128;

/// File part collected from the multipart body
struct UploadedFile {
    file_name: String,
    mime_type: String,
    bytes: Vec<u8>,
}

/// Append a chunk, failing once the running size passes `max`
fn append_limited(buf: &mut Vec<u8>, chunk: &[u8], max: usize) -> Result<(), AppError> {
    if buf.len() + chunk.len() > max {
        return Err(AppError::InvalidInput(format!(
            "File is larger than the {} byte limit",
            max
        )));
    }
    buf.extend_from_slice(chunk);
    Ok(())
}

/// Last path component, trimmed; browsers may send full client paths
fn clean_file_name(raw: &str) -> String {
    let name = raw
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or("")
        .trim();
    if name.is_empty() {
        "upload".to_string()
    } else {
        name.chars().take(255).collect()
    }
}

async fn read_field(field: &mut Field, max: usize) -> Result<Vec<u8>, AppError> {
    let mut buf = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk
            .map_err(|e| AppError::InvalidInput(format!("Invalid multipart body: {}", e)))?;
        append_limited(&mut buf, &chunk, max)?;
    }
    Ok(buf)
}

/// POST /media/upload
/// multipart/form-data with `file` and optional `property_id`
pub async fn upload_media(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    image_host: web::Data<ImageHostClient>,
    user: AuthUser,
    mut payload: Multipart,
) -> Result<impl Responder, AppError> {
    let mut file: Option<UploadedFile> = None;
    let mut property_id: Option<Uuid> = None;

    while let Some(item) = payload.next().await {
        let mut field =
            item.map_err(|e| AppError::InvalidInput(format!("Invalid multipart body: {}", e)))?;

        let name = field.name().to_string();
        match name.as_str() {
            "file" => {
                let file_name = clean_file_name(
                    field.content_disposition().get_filename().unwrap_or(""),
                );
                let mime_type = field
                    .content_type()
                    .map(|m| m.essence_str().to_ascii_lowercase())
                    .unwrap_or_default();

                if !is_allowed_image_type(&mime_type) {
                    return Err(AppError::InvalidInput(format!(
                        "Unsupported file type '{}', allowed: {}",
                        mime_type,
                        ALLOWED_IMAGE_TYPES.join(", ")
                    )));
                }

                let bytes = read_field(&mut field, config.max_upload_bytes).await?;
                file = Some(UploadedFile {
                    file_name,
                    mime_type,
                    bytes,
                });
            }
            "property_id" => {
                let raw = read_field(&mut field, MAX_TEXT_FIELD_BYTES).await?;
                let text = String::from_utf8_lossy(&raw);
                let text = text.trim();
                if !text.is_empty() {
                    property_id = Some(Uuid::parse_str(text).map_err(|_| {
                        AppError::InvalidInput(format!("Invalid property_id '{}'", text))
                    })?);
                }
            }
            other => {
                log::debug!("Ignoring multipart field {}", other);
                while let Some(chunk) = field.next().await {
                    chunk.map_err(|e| {
                        AppError::InvalidInput(format!("Invalid multipart body: {}", e))
                    })?;
                }
            }
        }
    }

    let file = match file {
        Some(file) if !file.bytes.is_empty() => file,
        _ => return Err(AppError::InvalidInput("Please upload a file".to_string())),
    };

    if let Some(id) = property_id {
        let property = PropertyRepository::get_active(pool.get_ref(), id).await?;
        ensure_owner_or_admin(&user, property.agent_id)?;
    }

    let size_bytes = file.bytes.len() as i64;
    let hosted = image_host
        .upload(file.bytes, &file.file_name, &file.mime_type)
        .await?;

    let media = MediaRepository::create(
        pool.get_ref(),
        &NewMedia {
            property_id,
            uploaded_by: user.id,
            url: hosted.url,
            thumbnail_url: hosted.thumbnail_url,
            delete_url: hosted.delete_url,
            provider_id: hosted.provider_id,
            file_name: file.file_name,
            mime_type: file.mime_type,
            size_bytes,
            width: hosted.width,
            height: hosted.height,
        },
    )
    .await?;

    Ok(HttpResponse::Created().json(ApiResponse::ok(media.to_response())))
}

/// GET /media/property/{property_id}
pub async fn list_property_media(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let property = PropertyRepository::get_active(pool.get_ref(), path.into_inner()).await?;
    let media = MediaRepository::list_for_property(pool.get_ref(), property.id).await?;
    let data: Vec<_> = media.iter().map(|m| m.to_response()).collect();
    Ok(HttpResponse::Ok().json(ApiResponse::ok(data)))
}

/// PUT /media/{id}/primary
pub async fn set_primary_media(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let media = MediaRepository::get_by_id(pool.get_ref(), path.into_inner()).await?;
    let property_id = media.property_id.ok_or_else(|| {
        AppError::InvalidInput("Media is not attached to a property".to_string())
    })?;

    let property = PropertyRepository::get_by_id(pool.get_ref(), property_id).await?;
    ensure_owner_or_admin(&user, property.agent_id)?;

    let updated = MediaRepository::set_primary(pool.get_ref(), property_id, media.id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(updated.to_response())))
}

/// DELETE /media/{id}
pub async fn delete_media(
    pool: web::Data<PgPool>,
    user: AuthUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let media = MediaRepository::get_by_id(pool.get_ref(), path.into_inner()).await?;
    ensure_owner_or_admin(&user, media.uploaded_by)?;

    MediaRepository::delete(pool.get_ref(), &media).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(json!({}))))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/media")
            .route("/upload", web::post().to(upload_media))
            .route("/property/{property_id}", web::get().to(list_property_media))
            .route("/{id}/primary", web::put().to(set_primary_media))
            .route("/{id}", web::delete().to(delete_media)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_limited() {
        let mut buf = Vec::new();
        assert!(append_limited(&mut buf, &[0u8; 600], 1024).is_ok());
        assert!(append_limited(&mut buf, &[0u8; 424], 1024).is_ok());
        assert_eq!(buf.len(), 1024);

        let err = append_limited(&mut buf, &[0u8; 1], 1024).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert_eq!(buf.len(), 1024);
    }

    #[test]
    fn test_clean_file_name() {
        assert_eq!(clean_file_name("C:\\Users\\me\\house.png"), "house.png");
        assert_eq!(clean_file_name("photos/front.jpg"), "front.jpg");
        assert_eq!(clean_file_name("  "), "upload");
        assert_eq!(clean_file_name(&"a".repeat(300)).len(), 255);
    }
}
