// src/services/image_host_client.rs
// DOCUMENTATION: Client for the external image CDN (imgbb compatible)
// PURPOSE: Forward uploaded image bytes and return the hosted URLs

use crate::config::Config;
use crate::errors::AppError;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

#[derive(Clone)]
pub struct ImageHostClient {
    client: Client,
    upload_url: String,
    api_key: String,
}

/// Upload response envelope
#[derive(Debug, Deserialize)]
pub struct ImageHostResponse {
    pub data: Option<ImageHostData>,
    #[serde(default)]
    pub success: bool,
    pub status: Option<u16>,
    pub error: Option<ImageHostError>,
}

#[derive(Debug, Deserialize)]
pub struct ImageHostError {
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ImageHostData {
    pub id: Option<String>,
    pub url: String,
    pub display_url: Option<String>,
    pub delete_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_i32")]
    pub width: Option<i32>,
    #[serde(default, deserialize_with = "lenient_i32")]
    pub height: Option<i32>,
    pub thumb: Option<ImageHostVariant>,
}

#[derive(Debug, Deserialize)]
pub struct ImageHostVariant {
    pub url: String,
}

/// Hosted image as stored in the media table
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedImage {
    pub provider_id: Option<String>,
    pub url: String,
    pub thumbnail_url: Option<String>,
    pub delete_url: Option<String>,
    pub width: Option<i32>,
    pub height: Option<i32>,
}

/// The host reports dimensions either as numbers or as numeric strings
fn lenient_i32<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_i64().and_then(|v| i32::try_from(v).ok()),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

impl ImageHostResponse {
    pub fn into_uploaded(self) -> Result<UploadedImage, AppError> {
        if !self.success {
            let msg = self
                .error
                .and_then(|e| e.message)
                .unwrap_or_else(|| format!("upload rejected (status {:?})", self.status));
            return Err(AppError::ExternalApiError(msg));
        }

        let data = self.data.ok_or_else(|| {
            AppError::ExternalApiError("Image host returned no data".to_string())
        })?;

        Ok(UploadedImage {
            provider_id: data.id,
            url: data.url,
            thumbnail_url: data.thumb.map(|t| t.url).or(data.display_url),
            delete_url: data.delete_url,
            width: data.width,
            height: data.height,
        })
    }
}

impl ImageHostClient {
    pub fn new(upload_url: String, api_key: String) -> Self {
        Self {
            client: Client::new(),
            upload_url,
            api_key,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.image_host_url.clone(), config.image_host_api_key.clone())
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Upload one image
    pub async fn upload(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        mime_type: &str,
    ) -> Result<UploadedImage, AppError> {
        if !self.is_configured() {
            log::error!("Upload attempted without IMAGE_HOST_API_KEY");
            return Err(AppError::ExternalApiError(
                "Image host is not configured".to_string(),
            ));
        }

        let size = bytes.len();
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime_type)
            .map_err(|e| AppError::InvalidInput(format!("Invalid content type: {}", e)))?;
        let form = Form::new().part("image", part);

        log::debug!("Uploading {} ({} bytes) to image host", file_name, size);

        let response = self
            .client
            .post(&self.upload_url)
            .query(&[("key", self.api_key.as_str())])
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                log::error!("Image host request failed: {}", e);
                AppError::ExternalApiError(format!("Upload failed: {}", e))
            })?;

        let status = response.status();
        let body: ImageHostResponse = response.json().await.map_err(|e| {
            log::error!("Failed to parse image host response ({}): {}", status, e);
            AppError::ExternalApiError(format!("Parse error: {}", e))
        })?;

        let uploaded = body.into_uploaded()?;
        log::info!("Uploaded {} to {}", file_name, uploaded.url);
        Ok(uploaded)
    }
}
